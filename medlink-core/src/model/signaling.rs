use crate::model::negotiation::{IceCandidate, SessionDescription};
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// One frame on the signaling channel: `{"event": "...", "data": ...}`.
///
/// `sdp` and `candidate` stay untyped JSON so the relay can pass them through
/// without understanding them; clients decode them with
/// [`SignalMessage::description`] and [`SignalMessage::ice_candidate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    Join { room_id: RoomId },
    Initiate(bool),
    Offer { room_id: RoomId, sdp: Value },
    Answer { room_id: RoomId, sdp: Value },
    IceCandidate { room_id: RoomId, candidate: Value },
    Disconnect { room_id: RoomId },
    Rejected { room_id: RoomId, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Join,
    Initiate,
    Offer,
    Answer,
    IceCandidate,
    Disconnect,
    Rejected,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::Join => "join",
            SignalKind::Initiate => "initiate",
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
            SignalKind::Disconnect => "disconnect",
            SignalKind::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

impl SignalMessage {
    pub fn offer(room_id: RoomId, desc: &SessionDescription) -> serde_json::Result<Self> {
        Ok(Self::Offer {
            room_id,
            sdp: serde_json::to_value(desc)?,
        })
    }

    pub fn answer(room_id: RoomId, desc: &SessionDescription) -> serde_json::Result<Self> {
        Ok(Self::Answer {
            room_id,
            sdp: serde_json::to_value(desc)?,
        })
    }

    pub fn candidate(room_id: RoomId, candidate: &IceCandidate) -> serde_json::Result<Self> {
        Ok(Self::IceCandidate {
            room_id,
            candidate: serde_json::to_value(candidate)?,
        })
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            SignalMessage::Join { .. } => SignalKind::Join,
            SignalMessage::Initiate(_) => SignalKind::Initiate,
            SignalMessage::Offer { .. } => SignalKind::Offer,
            SignalMessage::Answer { .. } => SignalKind::Answer,
            SignalMessage::IceCandidate { .. } => SignalKind::IceCandidate,
            SignalMessage::Disconnect { .. } => SignalKind::Disconnect,
            SignalMessage::Rejected { .. } => SignalKind::Rejected,
        }
    }

    /// `None` only for `Initiate`, which is addressed to a connection rather than a room.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            SignalMessage::Join { room_id }
            | SignalMessage::Offer { room_id, .. }
            | SignalMessage::Answer { room_id, .. }
            | SignalMessage::IceCandidate { room_id, .. }
            | SignalMessage::Disconnect { room_id }
            | SignalMessage::Rejected { room_id, .. } => Some(room_id),
            SignalMessage::Initiate(_) => None,
        }
    }

    /// Decode the SDP payload of an `offer`/`answer` frame.
    pub fn description(&self) -> Option<serde_json::Result<SessionDescription>> {
        match self {
            SignalMessage::Offer { sdp, .. } | SignalMessage::Answer { sdp, .. } => {
                Some(SessionDescription::deserialize(sdp))
            }
            _ => None,
        }
    }

    /// Decode the payload of an `ice-candidate` frame.
    pub fn ice_candidate(&self) -> Option<serde_json::Result<IceCandidate>> {
        match self {
            SignalMessage::IceCandidate { candidate, .. } => {
                Some(IceCandidate::deserialize(candidate))
            }
            _ => None,
        }
    }
}
