//! Wire messages. Tag and field spellings match the original client
//! protocol (kebab-case events, camelCase payload fields).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::room::DrawSource;
use crate::game::view::RoomSnapshot;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        room_code: String,
        name: String,
        password: String,
    },
    Join {
        room_code: String,
        name: String,
        password: String,
    },
    ToggleReady {
        room_code: String,
    },
    DrawCard {
        room_code: String,
        source: DrawSource,
    },
    DiscardCard {
        room_code: String,
        card_id: Uuid,
    },
    SubmitMelds {
        room_code: String,
        melds: Vec<Vec<Uuid>>,
        #[serde(default)]
        mark_go_out: bool,
    },
    RequestState {
        room_code: String,
    },
    ResetRound {
        room_code: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    JoinSuccess { room_code: String },
    CreateError { message: String },
    JoinError { message: String },
    MeldError { message: String },
    RoomState(RoomSnapshot),
}
