pub mod connection;
pub mod messages;
pub mod wire;

pub use connection::{ConnectionState, Transport, TransportConfig, TransportHandle};
pub use messages::{InboundMessage, OutboundMessage};
