use crate::media::{LocalMedia, MediaTrack};
use async_trait::async_trait;
use medlink_core::{IceCandidate, NegotiationError, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Callbacks of a peer connection, delivered to the owning session.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    LocalCandidate(IceCandidate),
    Track(Arc<dyn MediaTrack>),
    StateChanged(PeerConnectionState),
}

#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;
    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;
    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), NegotiationError>;
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), NegotiationError>;
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;
    async fn close(&self) -> Result<(), NegotiationError>;
}

/// Creates peer connections carrying `media`; their callbacks go to `events`.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    async fn connect(
        &self,
        media: &LocalMedia,
        events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>, NegotiationError>;
}
