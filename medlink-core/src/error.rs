use crate::model::{ConnectionId, RoomId};
use std::time::Duration;
use thiserror::Error;

/// Local media could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("capture permission denied")]
    PermissionDenied,
    #[error("no {0} capture device available")]
    NoDevice(&'static str),
    #[error("nothing to capture: audio and video both disabled")]
    NothingRequested,
    #[error("capture backend failed: {0}")]
    Backend(String),
}

/// Offer/answer/candidate exchange failed or was out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("answer received with no outstanding local offer")]
    NoOutstandingOffer,
    #[error("unexpected offer in state {0}")]
    UnexpectedOffer(&'static str),
    #[error("malformed session description: {0}")]
    MalformedDescription(String),
    #[error("malformed ICE candidate: {0}")]
    MalformedCandidate(String),
    #[error("peer connection rejected operation: {0}")]
    PeerConnection(String),
    #[error("negotiation did not complete within {0:?}")]
    Timeout(Duration),
}

/// The signaling transport failed or went away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("signaling channel closed")]
    Closed,
    #[error("failed to connect to signaling relay: {0}")]
    Connect(String),
    #[error("failed to encode signaling frame: {0}")]
    Encode(String),
    #[error("signaling transport error: {0}")]
    Transport(String),
    #[error("relay refused to join the room: {0}")]
    Rejected(String),
}

/// Registry bookkeeping disagrees with itself. Unreachable while the
/// registry invariants hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomStateError {
    #[error("connection {conn} indexed to room {room} which has no entry")]
    MissingRoom { conn: ConnectionId, room: RoomId },
    #[error("connection {conn} indexed to room {room} but not a member of it")]
    NotAMember { conn: ConnectionId, room: RoomId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
