pub mod audio;
pub mod config;
pub mod session;
pub mod transcript;
pub mod transport;

pub use audio::{
    AudioFrame, CaptureConfig, CaptureError, Chunk, ChunkAggregator, MicrophoneSource,
    SampleSource, SyntheticSource,
};
pub use config::Config;
pub use session::{
    SessionConfig, SessionController, SessionObserver, SessionState, SessionStats, SessionStatus,
};
pub use transcript::{Transcript, TranscriptReconciler};
pub use transport::{
    ConnectionState, InboundMessage, OutboundMessage, Transport, TransportConfig, TransportHandle,
};
