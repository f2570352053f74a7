use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a captioning session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether the session is currently recording
    pub is_recording: bool,

    /// When the session last started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Number of audio chunks transmitted so far
    pub chunks_sent: usize,

    /// Number of committed transcript paragraphs
    pub committed_paragraphs: usize,

    /// Whether an interim paragraph is still pending
    pub has_pending: bool,
}
