use crate::signaling::{
    ConnectionState, OutboundFrame, RelayAction, SignalingRelay, Transition, transition,
};
use medlink_core::{ConnectionId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Protocol driver for one transport connection.
///
/// Owns the connection's membership: dropping it (including when its task is
/// aborted) removes the connection from its room.
pub struct RelayConnection {
    id: ConnectionId,
    state: ConnectionState,
    room: Option<RoomId>,
    relay: SignalingRelay,
    outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    released: bool,
}

impl RelayConnection {
    pub(crate) fn new(
        id: ConnectionId,
        relay: SignalingRelay,
        outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    ) -> Self {
        Self {
            id,
            state: ConnectionState::Unjoined,
            room: None,
            relay,
            outbound,
            released: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Processes one text frame from the client.
    pub fn handle_text(&mut self, text: &str) -> Flow {
        let msg = match serde_json::from_str::<SignalMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(conn = %self.id, "Invalid SignalMessage: {}", e);
                return Flow::Continue;
            }
        };

        let previous = self.state;
        let Transition { next, action } = transition(self.state, self.room.as_ref(), &msg);
        self.state = next;

        match action {
            RelayAction::Join(room_id) => self.join(room_id, previous),
            RelayAction::Forward(room_id) => {
                self.relay.fan_out(self.id, &room_id, msg.kind(), text);
            }
            RelayAction::Leave => {
                self.release();
                return Flow::Close;
            }
            RelayAction::Drop(reason) => {
                warn!(conn = %self.id, event = %msg.kind(), state = %previous, "Dropped frame: {}", reason);
            }
        }

        Flow::Continue
    }

    fn join(&mut self, room_id: RoomId, previous: ConnectionState) {
        match self.relay.join(&room_id, self.id) {
            Ok(is_initiator) => {
                info!(conn = %self.id, room = %room_id, is_initiator, "Joined room");
                self.room = Some(room_id);
                self.relay
                    .send_signal(self.id, &SignalMessage::Initiate(is_initiator));
            }
            Err(full) => {
                warn!(conn = %self.id, room = %room_id, capacity = full.capacity, "Room is full");
                self.state = previous;
                self.relay.send_signal(
                    self.id,
                    &SignalMessage::Rejected {
                        room_id,
                        reason: "room is full".to_owned(),
                    },
                );
            }
        }
    }

    /// Next frame to write to the client. `None` once the connection is released.
    pub async fn next_outbound(&mut self) -> Option<String> {
        let frame = self.outbound.recv().await?;
        self.state = self.state.advance(frame.kind);
        Some(frame.text)
    }

    /// Leaves the room and stops accepting outbound frames. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.state = ConnectionState::Closed;
        self.relay.remove_peer(self.id);
        self.outbound.close();

        match self.relay.registry().leave(self.id) {
            Ok(Some(departure)) => info!(
                conn = %self.id,
                room = %departure.room_id,
                remaining = departure.remaining,
                "Left room"
            ),
            Ok(None) => debug!(conn = %self.id, "Closed without joining a room"),
            Err(e) => error!(conn = %self.id, "Room state error on leave: {}", e),
        }
        self.room = None;
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.release();
    }
}
