use std::time::Duration;

/// Configuration for a captioning session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Transcription server origin, e.g. "https://captions.example.com".
    /// The scheme is upgraded to the matching WebSocket variant.
    pub server_origin: String,

    /// Sample rate for capture (the backend expects 16kHz)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono)
    pub channels: u16,

    /// Samples per captured frame
    pub frame_len: usize,

    /// Wall-clock cadence between chunk flushes
    pub chunk_interval: Duration,

    /// Delay before a reconnect attempt after an unexpected close
    pub reconnect_backoff: Duration,

    /// Toggle the status signal to Processing every Nth transmitted chunk
    pub status_toggle_every: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("caption-{}", uuid::Uuid::new_v4()),
            server_origin: "http://localhost:8000".to_string(),
            sample_rate: 16000, // Whisper expects 16kHz
            channels: 1,        // Mono
            frame_len: 4096,
            chunk_interval: Duration::from_millis(1000),
            reconnect_backoff: Duration::from_millis(1000),
            status_toggle_every: 3,
        }
    }
}

impl SessionConfig {
    /// Capture settings for the sample source
    pub fn capture_config(&self) -> crate::audio::CaptureConfig {
        crate::audio::CaptureConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_len: self.frame_len,
        }
    }
}
