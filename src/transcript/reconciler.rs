use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::Transcript;
use crate::session::{SessionObserver, SessionStatus};
use crate::transport::InboundMessage;

/// Applies inbound transcription results to the shared transcript
///
/// Messages are consumed in wire-arrival order. There is no guarantee that
/// interim results arrive in the same relative order the chunks were sent;
/// the replace-not-merge policy for interim text tolerates that.
pub struct TranscriptReconciler {
    transcript: Arc<Mutex<Transcript>>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl TranscriptReconciler {
    pub fn new(
        transcript: Arc<Mutex<Transcript>>,
        observer: Option<Arc<dyn SessionObserver>>,
    ) -> Self {
        Self {
            transcript,
            observer,
        }
    }

    /// Consume inbound messages until the channel closes
    pub async fn run(self, mut inbound_rx: mpsc::Receiver<InboundMessage>) {
        info!("Transcript reconciler started");

        while let Some(message) = inbound_rx.recv().await {
            let InboundMessage::Transcription { text, is_final } = message else {
                continue;
            };

            let mut transcript = self.transcript.lock().await;
            if !transcript.apply(&text, is_final) {
                debug!("Empty transcription result ignored");
                continue;
            }

            if let Some(observer) = &self.observer {
                observer.transcript_updated(&transcript);
                if is_final {
                    // A committed paragraph means the backend caught up
                    observer.status_changed(SessionStatus::Listening);
                }
            }
        }

        info!("Transcript reconciler stopped");
    }
}
