//! Registry of rooms and session binding: room code -> room state, and
//! connection id -> (room, outbound channel).
//!
//! Every mutation of a room goes through that room's mutex, so intents for
//! one room apply strictly one at a time; distinct rooms never contend.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::game::room::{RoomState, MAX_PLAYERS};
use crate::game::view::snapshot_for;
use crate::protocol::ServerMessage;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Incorrect password.")]
    Unauthorized,
    #[error("Room code and name are required.")]
    MissingFields,
    #[error("That room code is already in use. Try another.")]
    DuplicateRoom,
    #[error("Room not found. Ask the host to create it first.")]
    RoomNotFound,
    #[error("Room is full ({MAX_PLAYERS} players max).")]
    RoomFull,
}

pub struct RoomHandle {
    pub state: Mutex<RoomState>,
}

/// A live connection bound to a player record in one room.
struct Session {
    room_code: String,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<String, Arc<RoomHandle>>>,
    sessions: Arc<DashMap<Uuid, Session>>,
    password: Arc<str>,
}

impl RoomRegistry {
    pub fn new(password: impl Into<Arc<str>>) -> Self {
        RoomRegistry {
            rooms: Arc::new(DashMap::new()),
            sessions: Arc::new(DashMap::new()),
            password: password.into(),
        }
    }

    fn check_access(&self, code: &str, name: &str, password: &str) -> Result<(), RegistryError> {
        if password != &*self.password {
            return Err(RegistryError::Unauthorized);
        }
        if code.is_empty() || name.is_empty() {
            return Err(RegistryError::MissingFields);
        }
        Ok(())
    }

    /// Create a room with the requester as its sole, unready player.
    pub fn create_room(
        &self,
        conn: Uuid,
        code: &str,
        name: &str,
        password: &str,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), RegistryError> {
        self.check_access(code, name, password)?;
        match self.rooms.entry(code.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegistryError::DuplicateRoom),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let mut state = RoomState::new(code.to_owned());
                state.add_player(conn, name.to_owned());
                entry.insert(Arc::new(RoomHandle { state: Mutex::new(state) }));
                self.sessions.insert(conn, Session { room_code: code.to_owned(), tx });
                tracing::info!(room = %code, player = %conn, "room created");
                Ok(())
            }
        }
    }

    /// Append a joiner to an existing room.
    pub fn join_room(
        &self,
        conn: Uuid,
        code: &str,
        name: &str,
        password: &str,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), RegistryError> {
        self.check_access(code, name, password)?;
        let handle = self.room(code).ok_or(RegistryError::RoomNotFound)?;
        {
            let mut state = handle.state.lock();
            if state.is_full() {
                return Err(RegistryError::RoomFull);
            }
            state.add_player(conn, name.to_owned());
        }
        self.sessions.insert(conn, Session { room_code: code.to_owned(), tx });
        tracing::info!(room = %code, player = %conn, "player joined");
        Ok(())
    }

    pub fn room(&self, code: &str) -> Option<Arc<RoomHandle>> {
        self.rooms.get(code).map(|r| r.clone())
    }

    /// Tear down a departed connection: drop the player from their room,
    /// delete the room if it emptied, otherwise tell the survivors.
    pub fn disconnect(&self, conn: Uuid) {
        let Some((_, session)) = self.sessions.remove(&conn) else {
            return;
        };
        let Some(handle) = self.room(&session.room_code) else {
            return;
        };
        let empty = handle.state.lock().remove_player(conn);
        if empty {
            self.rooms.remove(&session.room_code);
            tracing::info!(room = %session.room_code, "room emptied, removed");
        } else {
            self.broadcast(&session.room_code);
        }
    }

    /// Recompute and push the per-player snapshot to every connected member.
    pub fn broadcast(&self, code: &str) {
        let Some(handle) = self.room(code) else {
            return;
        };
        let state = handle.state.lock();
        for player in &state.players {
            if let Some(session) = self.sessions.get(&player.id) {
                let _ = session
                    .tx
                    .send(ServerMessage::RoomState(snapshot_for(&state, player.id)));
            }
        }
    }

    /// Re-send the current snapshot to one connection only (reconnect aid).
    pub fn send_state(&self, conn: Uuid, code: &str) {
        let Some(handle) = self.room(code) else {
            return;
        };
        if let Some(session) = self.sessions.get(&conn) {
            let state = handle.state.lock();
            let _ = session.tx.send(ServerMessage::RoomState(snapshot_for(&state, conn)));
        }
    }
}
