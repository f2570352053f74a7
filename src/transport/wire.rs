// Wire-level encoding helpers
//
// Audio crosses the socket as base64 text: each f32 sample becomes four
// little-endian IEEE-754 bytes, in capture order.

use anyhow::{bail, Context, Result};
use base64::Engine;

/// Path identifying the transcription service on the backend
const TRANSCRIBE_PATH: &str = "/ws/transcribe/";

/// Encode samples to the base64 chunk payload
pub fn encode_samples(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a base64 chunk payload back to samples
pub fn decode_samples(data: &str) -> Result<Vec<f32>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .context("Invalid base64 audio payload")?;

    if bytes.len() % 4 != 0 {
        bail!("Audio payload length {} is not a multiple of 4", bytes.len());
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Derive the WebSocket endpoint from a server origin
///
/// The scheme is upgraded to the duplex variant matching the origin's
/// transport security (http -> ws, https -> wss); ws(s) origins pass
/// through unchanged. The service path is fixed.
pub fn endpoint_url(origin: &str) -> Result<String> {
    let origin = origin.trim_end_matches('/');

    let upgraded = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if origin.starts_with("ws://") || origin.starts_with("wss://") {
        origin.to_string()
    } else {
        bail!("Unsupported origin scheme: {}", origin);
    };

    Ok(format!("{}{}", upgraded, TRANSCRIBE_PATH))
}
