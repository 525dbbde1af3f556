use crate::config::ServerConfig;
use crate::room::{RoomFull, RoomRegistry};
use crate::signaling::RelayConnection;
use dashmap::DashMap;
use medlink_core::{ConnectionId, RoomId, SignalKind, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// A frame queued for delivery to one connection.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub kind: SignalKind,
    pub text: String,
}

struct RelayInner {
    registry: RoomRegistry,
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<OutboundFrame>>,
    max_room_members: Option<usize>,
}

/// Shared relay state: room membership plus the outbound queue of every live connection.
#[derive(Clone)]
pub struct SignalingRelay {
    inner: Arc<RelayInner>,
}

impl SignalingRelay {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            inner: Arc::new(RelayInner {
                registry: RoomRegistry::new(),
                peers: DashMap::new(),
                max_room_members: config.max_room_members,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn connection_count(&self) -> usize {
        self.inner.peers.len()
    }

    /// Registers a new transport connection and hands back its protocol driver.
    pub fn connect(&self) -> RelayConnection {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.peers.insert(id, tx);
        RelayConnection::new(id, self.clone(), rx)
    }

    pub(crate) fn remove_peer(&self, conn: ConnectionId) {
        self.inner.peers.remove(&conn);
    }

    pub(crate) fn join(&self, room_id: &RoomId, conn: ConnectionId) -> Result<bool, RoomFull> {
        match self.inner.max_room_members {
            Some(capacity) => self.inner.registry.join_capped(room_id, conn, capacity),
            None => Ok(self.inner.registry.join(room_id, conn)),
        }
    }

    /// Serializes `msg` and queues it for `conn` only.
    pub(crate) fn send_signal(&self, conn: ConnectionId, msg: &SignalMessage) {
        match serde_json::to_string(msg) {
            Ok(text) => {
                self.deliver(
                    conn,
                    OutboundFrame {
                        kind: msg.kind(),
                        text,
                    },
                );
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }

    fn deliver(&self, conn: ConnectionId, frame: OutboundFrame) -> bool {
        let Some(peer) = self.inner.peers.get(&conn) else {
            warn!(%conn, "Attempted to send signal to disconnected connection");
            return false;
        };
        if let Err(e) = peer.send(frame) {
            error!(%conn, "Failed to queue frame: {}", e);
            return false;
        }
        true
    }

    /// Queues `text` for every member of `room_id` except `from`. Returns how many were reached.
    pub(crate) fn fan_out(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        kind: SignalKind,
        text: &str,
    ) -> usize {
        let peers = self.inner.registry.peers(room_id, from);
        let mut delivered = 0;

        for peer in peers {
            let frame = OutboundFrame {
                kind,
                text: text.to_owned(),
            };
            if self.deliver(peer, frame) {
                delivered += 1;
            }
        }

        debug!(conn = %from, room = %room_id, event = %kind, delivered, "Relayed frame");
        delivered
    }
}

impl Default for SignalingRelay {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}
