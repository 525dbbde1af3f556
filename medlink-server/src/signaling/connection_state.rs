use medlink_core::{RoomId, SignalKind, SignalMessage};
use std::fmt;

/// Lifecycle of one relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unjoined,
    Joined,
    Negotiating,
    Active,
    Closed,
}

impl ConnectionState {
    pub fn is_joined(self) -> bool {
        matches!(
            self,
            ConnectionState::Joined | ConnectionState::Negotiating | ConnectionState::Active
        )
    }

    /// Offer/answer progress, applied to frames in both directions.
    pub fn advance(self, kind: SignalKind) -> Self {
        match (self, kind) {
            (ConnectionState::Joined, SignalKind::Offer) => ConnectionState::Negotiating,
            (ConnectionState::Joined | ConnectionState::Negotiating, SignalKind::Answer) => {
                ConnectionState::Active
            }
            (state, _) => state,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What the relay must do for a frame received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayAction {
    /// Register in `room` (leaving any other room) and answer with `initiate`.
    Join(RoomId),
    /// Pass the frame unchanged to every other member of `room`.
    Forward(RoomId),
    /// Leave the room and close the connection.
    Leave,
    /// Log and discard.
    Drop(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ConnectionState,
    pub action: RelayAction,
}

impl Transition {
    fn to(next: ConnectionState, action: RelayAction) -> Self {
        Self { next, action }
    }

    fn drop(state: ConnectionState, reason: &'static str) -> Self {
        Self::to(state, RelayAction::Drop(reason))
    }
}

/// `(state, client frame) -> (next state, action)`.
///
/// `current_room` is the room this connection is registered in, if any.
pub fn transition(
    state: ConnectionState,
    current_room: Option<&RoomId>,
    msg: &SignalMessage,
) -> Transition {
    use ConnectionState::*;

    if state == Closed {
        return Transition::drop(Closed, "connection closed");
    }

    match msg {
        SignalMessage::Join { room_id } => {
            let next = match current_room {
                Some(current) if current == room_id && state.is_joined() => state,
                _ => Joined,
            };
            Transition::to(next, RelayAction::Join(room_id.clone()))
        }

        SignalMessage::Disconnect { .. } => Transition::to(Closed, RelayAction::Leave),

        SignalMessage::Initiate(_) | SignalMessage::Rejected { .. } => {
            Transition::drop(state, "relay-only event sent by client")
        }

        SignalMessage::Offer { room_id, .. }
        | SignalMessage::Answer { room_id, .. }
        | SignalMessage::IceCandidate { room_id, .. } => {
            if !state.is_joined() {
                return Transition::drop(state, "not joined to a room");
            }
            if current_room != Some(room_id) {
                return Transition::drop(state, "addressed to a room the connection is not in");
            }
            Transition::to(state.advance(msg.kind()), RelayAction::Forward(room_id.clone()))
        }
    }
}
