use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use medlink_core::{ConnectionId, RoomId, RoomStateError};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of removing a connection from its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    /// Members left behind; `0` means the room entry was deleted.
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomFull {
    pub room_id: RoomId,
    pub capacity: usize,
}

/// Room membership bookkeeping.
///
/// Both maps are sharded, so operations on different rooms only meet when
/// their keys hash to the same shard, and every mutation of one room's
/// member set happens under that room's entry lock. A room key is present
/// exactly while its member set is non-empty.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, HashSet<ConnectionId>>>,
    memberships: Arc<DashMap<ConnectionId, RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `conn` to `room_id`, returning whether it is now the only member.
    ///
    /// Joining the room the connection is already in changes nothing. Joining
    /// a different room moves the connection out of its previous one.
    pub fn join(&self, room_id: &RoomId, conn: ConnectionId) -> bool {
        matches!(self.join_inner(room_id, conn, None), Ok(true))
    }

    /// Same as [`join`](Self::join) but refuses to grow the room beyond `capacity`.
    pub fn join_capped(
        &self,
        room_id: &RoomId,
        conn: ConnectionId,
        capacity: usize,
    ) -> Result<bool, RoomFull> {
        self.join_inner(room_id, conn, Some(capacity))
    }

    fn join_inner(
        &self,
        room_id: &RoomId,
        conn: ConnectionId,
        capacity: Option<usize>,
    ) -> Result<bool, RoomFull> {
        let full = |capacity| RoomFull {
            room_id: room_id.clone(),
            capacity,
        };

        let is_initiator = match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(mut entry) => {
                let members = entry.get_mut();
                if let Some(capacity) = capacity {
                    if !members.contains(&conn) && members.len() >= capacity {
                        return Err(full(capacity));
                    }
                }
                members.insert(conn);
                members.len() == 1
            }
            Entry::Vacant(entry) => {
                if capacity == Some(0) {
                    return Err(full(0));
                }
                entry.insert(HashSet::from([conn]));
                true
            }
        };

        let previous = self.memberships.insert(conn, room_id.clone());
        if let Some(previous) = previous.filter(|prev| prev != room_id) {
            if let Err(e) = self.remove_member(&previous, conn) {
                tracing::error!(%conn, room = %previous, "Room switch cleanup failed: {}", e);
            }
        }

        Ok(is_initiator)
    }

    /// Removes `conn` from whatever room holds it. `Ok(None)` if it held none.
    pub fn leave(&self, conn: ConnectionId) -> Result<Option<Departure>, RoomStateError> {
        let Some((_, room_id)) = self.memberships.remove(&conn) else {
            return Ok(None);
        };

        let remaining = self.remove_member(&room_id, conn)?;
        Ok(Some(Departure { room_id, remaining }))
    }

    fn remove_member(&self, room_id: &RoomId, conn: ConnectionId) -> Result<usize, RoomStateError> {
        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(mut entry) => {
                let was_member = entry.get_mut().remove(&conn);
                let remaining = entry.get().len();
                if remaining == 0 {
                    entry.remove();
                }
                if was_member {
                    Ok(remaining)
                } else {
                    Err(RoomStateError::NotAMember {
                        conn,
                        room: room_id.clone(),
                    })
                }
            }
            Entry::Vacant(_) => Err(RoomStateError::MissingRoom {
                conn,
                room: room_id.clone(),
            }),
        }
    }

    /// Snapshot of the members of `room_id` other than `except`.
    pub fn peers(&self, room_id: &RoomId, except: ConnectionId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().copied().filter(|c| *c != except).collect())
            .unwrap_or_default()
    }

    pub fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.memberships.get(&conn).map(|room| room.value().clone())
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map(|m| m.len()).unwrap_or(0)
    }

    pub fn contains_room(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
