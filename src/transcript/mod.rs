//! Transcript state and interim/final reconciliation
//!
//! The transcript is an ordered list of committed paragraphs plus at most
//! one pending (interim) paragraph. Interim results replace the pending
//! paragraph wholesale; final results commit a new paragraph and discard
//! whatever interim text preceded them.

mod reconciler;

pub use reconciler::TranscriptReconciler;

/// Accumulated transcription state
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    committed: Vec<String>,
    pending: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transcription result. Returns whether anything changed.
    ///
    /// A final result appends a committed paragraph and supersedes the
    /// pending interim text (the final is authoritative, not merged). An
    /// interim result is a full snapshot of the in-progress utterance and
    /// replaces the pending paragraph verbatim. Empty text is a no-op
    /// regardless of the final flag.
    pub fn apply(&mut self, text: &str, is_final: bool) -> bool {
        if text.is_empty() {
            return false;
        }

        if is_final {
            self.committed.push(text.to_string());
            self.pending = None;
        } else {
            self.pending = Some(text.to_string());
        }

        true
    }

    /// Committed paragraphs, in arrival order of final results
    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    /// The in-progress interim paragraph, if any
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.pending.is_none()
    }

    /// Render the whole transcript, paragraphs separated by blank lines,
    /// with the pending paragraph (if any) last
    pub fn render(&self) -> String {
        let mut paragraphs: Vec<&str> = self.committed.iter().map(String::as_str).collect();
        if let Some(pending) = &self.pending {
            paragraphs.push(pending);
        }
        paragraphs.join("\n\n")
    }
}
