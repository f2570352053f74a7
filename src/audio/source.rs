use anyhow::Result;
use thiserror::Error;
use tokio::sync::mpsc;

/// Audio sample data (32-bit float PCM, mono)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (f32 PCM, one channel)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a sample source
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate
    pub sample_rate: u32,
    /// Channel count (1 = mono)
    pub channels: u16,
    /// Samples per delivered frame
    pub frame_len: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz for Whisper
            channels: 1,        // Mono
            frame_len: 4096,    // Latency vs. per-callback overhead
        }
    }
}

/// Errors surfaced by sample source acquisition
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Microphone access denied or no usable device. Fatal to session start;
    /// recoverable by retrying start.
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    /// `start()` called while a capture is already running
    #[error("capture already running")]
    AlreadyCapturing,
}

/// Push-based audio frame producer
///
/// Implementations:
/// - `MicrophoneSource`: real device capture via cpal
/// - `SyntheticSource`: scripted frame sequences for deterministic tests
///
/// Frames are delivered exactly once, in capture order, through the channel
/// returned by `start()`. No frame is produced after `stop()` returns.
/// Acquisition is all-or-nothing: a failed `start()` leaves no device handle
/// or processing graph allocated.
#[async_trait::async_trait]
pub trait SampleSource: Send + Sync {
    /// Acquire the device and begin producing frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    /// Release the device. No-op when not capturing.
    async fn stop(&mut self) -> Result<()>;

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}
