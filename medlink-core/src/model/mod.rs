mod connection;
mod negotiation;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use negotiation::{IceCandidate, SdpType, SessionDescription};
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalKind, SignalMessage};
