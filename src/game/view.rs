//! Per-player projection of room state. Pure: the transport layer decides
//! where the snapshot goes.

use serde::Serialize;
use uuid::Uuid;

use crate::game::cards::{Card, Rank};
use crate::game::room::{RoomState, RoomStatus};

/// What everyone can see about a player: hand size but never hand contents,
/// laid melds in full (they are public once declared).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
    pub hand_count: usize,
    pub score: u32,
    pub gone_out: bool,
    pub laid_melds: Vec<Card>,
    pub last_turn_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    /// Unix timestamp of room creation.
    pub created_at: i64,
    pub round: u8,
    pub cards_per_player: u8,
    pub wild_rank: Rank,
    pub discard_top: Option<Card>,
    pub draw_count: usize,
    pub current_turn_player_id: Option<Uuid>,
    pub go_out_player_id: Option<Uuid>,
    pub status: RoomStatus,
    pub players: Vec<PlayerView>,
    pub you: Uuid,
    /// The viewer's own cards. Everyone else sees only `hand_count`.
    pub hand: Vec<Card>,
}

pub fn snapshot_for(room: &RoomState, viewer: Uuid) -> RoomSnapshot {
    let players = room
        .players
        .iter()
        .map(|p| PlayerView {
            id: p.id,
            name: p.name.clone(),
            ready: p.ready,
            hand_count: p.hand.len(),
            score: p.score,
            gone_out: p.gone_out,
            laid_melds: p.laid.cards.clone(),
            last_turn_complete: p.last_turn_complete,
        })
        .collect();
    let hand = room
        .player(viewer)
        .map(|p| p.hand.clone())
        .unwrap_or_default();
    RoomSnapshot {
        room_code: room.code.clone(),
        created_at: room.created_at.unix_timestamp(),
        round: room.round,
        cards_per_player: room.cards_per_player(),
        wild_rank: room.wild(),
        discard_top: room.discard_pile.last().copied(),
        draw_count: room.draw_pile.len(),
        current_turn_player_id: room.current_turn,
        go_out_player_id: room.go_out_player,
        status: room.status,
        players,
        you: viewer,
        hand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_player_room() -> (RoomState, Vec<Uuid>) {
        let mut room = RoomState::new("ABCD".into());
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        room.add_player(ids[0], "alice".into());
        room.add_player(ids[1], "bob".into());
        room.toggle_ready(ids[0]);
        room.toggle_ready(ids[1]);
        (room, ids)
    }

    #[test]
    fn viewer_sees_own_hand_and_only_counts_for_others() {
        let (room, ids) = two_player_room();
        let snap = snapshot_for(&room, ids[0]);
        assert_eq!(snap.you, ids[0]);
        assert_eq!(snap.hand.len(), 3);
        assert_eq!(snap.hand, room.player(ids[0]).unwrap().hand);
        for view in &snap.players {
            assert_eq!(view.hand_count, 3);
        }
        // The other player's snapshot shows a different hand.
        let other = snapshot_for(&room, ids[1]);
        assert_ne!(other.hand, snap.hand);
    }

    #[test]
    fn snapshot_carries_round_and_pile_facts() {
        let (room, ids) = two_player_room();
        let snap = snapshot_for(&room, ids[1]);
        assert_eq!(snap.room_code, "ABCD");
        assert_eq!(snap.created_at, room.created_at.unix_timestamp());
        assert!(snap.created_at > 0);
        assert_eq!(snap.round, 1);
        assert_eq!(snap.cards_per_player, 3);
        assert_eq!(snap.wild_rank, Rank::Three);
        assert_eq!(snap.draw_count, room.draw_pile.len());
        assert_eq!(snap.discard_top.map(|c| c.id), room.discard_pile.last().map(|c| c.id));
        assert_eq!(snap.status, RoomStatus::Playing);
        assert_eq!(snap.current_turn_player_id, Some(ids[1]));
        assert_eq!(snap.go_out_player_id, None);
    }

    #[test]
    fn unknown_viewer_gets_an_empty_hand() {
        let (room, _) = two_player_room();
        let snap = snapshot_for(&room, Uuid::new_v4());
        assert!(snap.hand.is_empty());
        assert_eq!(snap.players.len(), 2);
    }

    #[test]
    fn snapshot_serializes_ranks_in_wire_form() {
        let (room, ids) = two_player_room();
        let json = serde_json::to_value(snapshot_for(&room, ids[0])).unwrap();
        assert_eq!(json["wildRank"], "3");
        assert_eq!(json["roomCode"], "ABCD");
        assert!(json["players"][0]["handCount"].is_number());
    }
}
