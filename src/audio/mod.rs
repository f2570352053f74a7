pub mod aggregator;
pub mod microphone;
pub mod source;
pub mod synthetic;

pub use aggregator::{Chunk, ChunkAggregator};
pub use microphone::MicrophoneSource;
pub use source::{AudioFrame, CaptureConfig, CaptureError, SampleSource};
pub use synthetic::SyntheticSource;
