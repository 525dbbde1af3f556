pub mod negotiation;
mod peer_session;
mod session_event;

pub use negotiation::{NegotiationState, Role};
pub use peer_session::*;
pub use session_event::*;

use crate::config::ClientConfig;
use crate::media::MediaCapture;
use crate::transport::{RtcConnector, WsChannel};
use medlink_core::{RoomId, SessionError};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Connects to the configured relay and starts a webrtc-rs backed session.
pub async fn join_call(
    config: &ClientConfig,
    room_id: RoomId,
    capture: &dyn MediaCapture,
) -> Result<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
    let (channel, inbound) = WsChannel::connect(&config.relay_url).await?;
    let connector = RtcConnector::new(config.ice_servers.clone());
    let parts = SessionParts {
        capture,
        connector: &connector,
        channel: Arc::new(channel),
        inbound,
    };
    PeerSession::start(config, room_id, parts).await
}
