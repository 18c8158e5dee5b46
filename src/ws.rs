//! WebSocket connection lifecycle: upgrade, outbound forward task, inbound
//! intent dispatch, disconnect cleanup.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::RoomRegistry;

pub async fn ws_handler(State(registry): State<RoomRegistry>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(registry, socket))
}

async fn handle_socket(registry: RoomRegistry, socket: WebSocket) {
    // One player record per connection, bound on create/join.
    let conn = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let forward = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(%err, "failed to encode server message"),
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(intent) => dispatch(&registry, conn, &tx, intent),
                // Malformed intents are dropped; they must never take the
                // room down for everyone else.
                Err(err) => debug!(%conn, %err, "ignoring malformed intent"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    registry.disconnect(conn);
    forward.abort();
    debug!(%conn, "ws closed");
}

fn dispatch(
    registry: &RoomRegistry,
    conn: Uuid,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    intent: ClientMessage,
) {
    match intent {
        ClientMessage::CreateRoom { room_code, name, password } => {
            match registry.create_room(conn, &room_code, &name, &password, tx.clone()) {
                Ok(()) => {
                    let _ = tx.send(ServerMessage::JoinSuccess { room_code: room_code.clone() });
                    registry.broadcast(&room_code);
                }
                Err(err) => {
                    let _ = tx.send(ServerMessage::CreateError { message: err.to_string() });
                }
            }
        }
        ClientMessage::Join { room_code, name, password } => {
            match registry.join_room(conn, &room_code, &name, &password, tx.clone()) {
                Ok(()) => {
                    let _ = tx.send(ServerMessage::JoinSuccess { room_code: room_code.clone() });
                    registry.broadcast(&room_code);
                }
                Err(err) => {
                    let _ = tx.send(ServerMessage::JoinError { message: err.to_string() });
                }
            }
        }
        ClientMessage::ToggleReady { room_code } => {
            if let Some(handle) = registry.room(&room_code) {
                let outcome = handle.state.lock().toggle_ready(conn);
                if outcome.applied() {
                    registry.broadcast(&room_code);
                }
            }
        }
        ClientMessage::DrawCard { room_code, source } => {
            if let Some(handle) = registry.room(&room_code) {
                let outcome = handle.state.lock().draw(conn, source);
                if outcome.applied() {
                    registry.broadcast(&room_code);
                }
            }
        }
        ClientMessage::DiscardCard { room_code, card_id } => {
            if let Some(handle) = registry.room(&room_code) {
                let outcome = handle.state.lock().discard(conn, card_id);
                if outcome.applied() {
                    registry.broadcast(&room_code);
                }
            }
        }
        ClientMessage::SubmitMelds { room_code, melds, mark_go_out } => {
            if let Some(handle) = registry.room(&room_code) {
                let result = handle.state.lock().submit_melds(conn, &melds, mark_go_out);
                match result {
                    Ok(outcome) => {
                        if outcome.applied() {
                            registry.broadcast(&room_code);
                        }
                    }
                    // Rejections go to the submitter alone; room state is
                    // untouched so nobody else hears about it.
                    Err(err) => {
                        let _ = tx.send(ServerMessage::MeldError { message: err.to_string() });
                    }
                }
            }
        }
        ClientMessage::RequestState { room_code } => {
            registry.send_state(conn, &room_code);
        }
        ClientMessage::ResetRound { room_code } => {
            if let Some(handle) = registry.room(&room_code) {
                let outcome = handle.state.lock().reset();
                if outcome.applied() {
                    registry.broadcast(&room_code);
                }
            }
        }
    }
}
