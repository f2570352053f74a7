use serde::{Deserialize, Serialize};

use super::wire;

/// Message sent to the transcription backend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// One chunk of audio, base64-encoded little-endian f32 samples
    #[serde(rename = "audio_data")]
    AudioData { data: String },

    /// End-of-stream marker sent at session stop
    #[serde(rename = "end_stream")]
    EndStream,
}

impl OutboundMessage {
    /// Build an `audio_data` message from raw samples
    pub fn audio(samples: &[f32]) -> Self {
        Self::AudioData {
            data: wire::encode_samples(samples),
        }
    }
}

/// Message received from the transcription backend
///
/// Unrecognized `type` tags deserialize to `Unknown` and are dropped by the
/// transport, never treated as fatal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "transcription")]
    Transcription {
        text: String,
        #[serde(rename = "final", default)]
        is_final: bool,
    },

    #[serde(other)]
    Unknown,
}
