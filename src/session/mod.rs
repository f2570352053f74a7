//! Captioning session management
//!
//! This module provides the `SessionController` abstraction that manages:
//! - Audio capture through a `SampleSource`
//! - Chunk aggregation and cadenced transmission
//! - Transport lifecycle (connect, reconnect, close)
//! - Transcript reconciliation
//! - Session statistics and status notifications

mod config;
mod controller;
mod observer;
mod stats;

pub use config::SessionConfig;
pub use controller::{SessionController, SessionState};
pub use observer::{SessionObserver, SessionStatus};
pub use stats::SessionStats;
