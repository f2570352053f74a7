// Scripted sample source for deterministic tests

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::source::{AudioFrame, CaptureError, SampleSource};

/// Sample source that replays a fixed frame sequence
///
/// Frames are delivered in order with a configurable gap between them.
/// After the script is exhausted the channel is held open until `stop()`,
/// mimicking a live device that has simply gone quiet.
pub struct SyntheticSource {
    frames: Vec<AudioFrame>,
    frame_gap: Duration,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    pub fn new(frames: Vec<AudioFrame>, frame_gap: Duration) -> Self {
        Self {
            frames,
            frame_gap,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    /// Build a script of silent frames
    pub fn silence(frame_count: usize, frame_len: usize, sample_rate: u32) -> Vec<AudioFrame> {
        let frame_duration_ms = frame_len as u64 * 1000 / sample_rate as u64;
        (0..frame_count)
            .map(|i| AudioFrame {
                samples: vec![0.0; frame_len],
                sample_rate,
                channels: 1,
                timestamp_ms: i as u64 * frame_duration_ms,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl SampleSource for SyntheticSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.capturing.load(Ordering::SeqCst) {
            return Err(CaptureError::AlreadyCapturing);
        }

        let (tx, rx) = mpsc::channel(64);
        self.capturing.store(true, Ordering::SeqCst);

        let frames = self.frames.clone();
        let frame_gap = self.frame_gap;
        let capturing = Arc::clone(&self.capturing);

        self.task = Some(tokio::spawn(async move {
            for frame in frames {
                if !capturing.load(Ordering::SeqCst) {
                    return;
                }
                if tx.send(frame).await.is_err() {
                    debug!("Synthetic frame dropped: receiver closed");
                    return;
                }
                tokio::time::sleep(frame_gap).await;
            }

            // Script exhausted: keep the channel open until stopped
            while capturing.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        self.capturing.store(false, Ordering::SeqCst);
        if let Err(e) = task.await {
            error!("Synthetic source task panicked: {}", e);
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
