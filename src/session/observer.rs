use crate::transcript::Transcript;

/// Coarse user-facing status signal
///
/// Derived from chunk-flush cadence: every Nth transmitted chunk toggles to
/// Processing, otherwise Listening; a final transcription result switches
/// back to Listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Listening,
    Processing,
}

/// Notification interface for the UI layer
///
/// The core emits events into this trait; rendering policy is entirely the
/// collaborator's concern. Default implementations ignore everything, so an
/// observer only overrides what it renders.
pub trait SessionObserver: Send + Sync {
    fn status_changed(&self, _status: SessionStatus) {}

    fn transcript_updated(&self, _transcript: &Transcript) {}
}
