use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub server: ServerConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Transcription backend origin (http or https; scheme is upgraded to
    /// the matching WebSocket variant)
    pub origin: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_len: usize,
    pub chunk_interval_ms: u64,
    pub reconnect_backoff_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Lower file settings into a session configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            server_origin: self.server.origin.clone(),
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            frame_len: self.audio.frame_len,
            chunk_interval: Duration::from_millis(self.audio.chunk_interval_ms),
            reconnect_backoff: Duration::from_millis(self.audio.reconnect_backoff_ms),
            ..SessionConfig::default()
        }
    }
}
