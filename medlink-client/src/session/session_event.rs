use crate::media::MediaTrack;
use crate::session::{NegotiationState, Role};
use crate::transport::PeerConnectionState;
use medlink_core::SessionError;
use std::sync::Arc;

/// What a running session reports to its owner.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    RoleAssigned(Role),
    StateChanged(NegotiationState),
    RemoteTrack(Arc<dyn MediaTrack>),
    ConnectionState(PeerConnectionState),
    /// The relay went away after the call was established. Media keeps flowing.
    ChannelClosed,
    Error(SessionError),
    /// Teardown finished. Always the last event.
    Ended,
}
