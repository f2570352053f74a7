// Chunk aggregation on a wall-clock cadence
//
// Frames accumulate in an unbounded buffer; a chunk is released when at
// least the configured interval has elapsed since the previous flush. The
// flush clock resets to the flush time (not the push time) so jitter in
// frame arrival never compounds into drift.

use tokio::time::{Duration, Instant};
use tracing::debug;

use super::source::AudioFrame;

/// A batch of audio released for transmission
///
/// Transient: exists between aggregation and encoding, then discarded.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Concatenated samples of every frame since the last flush, capture order
    pub samples: Vec<f32>,
}

/// Accumulates audio frames and releases chunks on a fixed cadence
///
/// The aggregator is transport-agnostic: it releases a chunk whenever the
/// cadence allows, and the caller decides whether the connection state makes
/// the chunk sendable. Chunks released while the connection is down are
/// dropped, never queued — freshness over completeness for live captioning.
pub struct ChunkAggregator {
    buffer: Vec<f32>,
    chunk_interval: Duration,
    last_flush: Instant,
    chunks_released: usize,
}

impl ChunkAggregator {
    pub fn new(chunk_interval: Duration) -> Self {
        Self {
            buffer: Vec::new(),
            chunk_interval,
            last_flush: Instant::now(),
            chunks_released: 0,
        }
    }

    /// Append a frame; release a chunk when the cadence has elapsed
    pub fn push(&mut self, frame: &AudioFrame) -> Option<Chunk> {
        self.buffer.extend_from_slice(&frame.samples);

        let now = Instant::now();
        if now.duration_since(self.last_flush) < self.chunk_interval {
            return None;
        }

        // Reset to flush time so the next interval starts here
        self.last_flush = now;
        self.chunks_released += 1;

        let samples = std::mem::take(&mut self.buffer);
        debug!(
            "Chunk {} released ({} samples)",
            self.chunks_released,
            samples.len()
        );

        Some(Chunk { samples })
    }

    /// Discard buffered audio and restart the flush clock
    pub fn reset(&mut self) {
        if !self.buffer.is_empty() {
            debug!("Discarding {} buffered samples", self.buffer.len());
        }
        self.buffer.clear();
        self.last_flush = Instant::now();
    }

    /// Number of samples currently buffered
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Number of chunks released since construction
    pub fn chunks_released(&self) -> usize {
        self.chunks_released
    }
}
