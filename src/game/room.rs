//! Room state machine: lobby, deal, the draw/discard turn cycle, the
//! going-out countdown and round scoring.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::game::cards::{build_deck, card_value, shuffle, wild_rank, Card, Rank};
use crate::game::melds::{validate_melds, LaidMelds, MeldError};

pub const MAX_PLAYERS: usize = 7;
pub const MIN_PLAYERS: usize = 2;
pub const TOTAL_ROUNDS: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Lobby,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawSource {
    Draw,
    Discard,
}

/// Whether an intent changed room state. Invalid intents (out of turn,
/// double draw, discard before draw) are ignored without error, and the
/// transport skips the broadcast for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
}

impl Outcome {
    pub fn applied(self) -> bool {
        self == Outcome::Applied
    }
}

/// Errors surfaced to the submitter on a rejected meld submission. Everything
/// else in the turn engine fails silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Meld(#[from] MeldError),
    #[error("You can only go out on your turn")]
    GoOutOutOfTurn,
    #[error("Draw first, then go out with one card left to discard")]
    GoOutBeforeDraw,
    #[error("Going out requires melding all but one card")]
    WrongLeftoverCount,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
    pub score: u32,
    pub hand: Vec<Card>,
    pub has_drawn: bool,
    pub gone_out: bool,
    pub last_turn_complete: bool,
    pub laid: LaidMelds,
}

impl Player {
    fn new(id: Uuid, name: String) -> Self {
        Player {
            id,
            name,
            ready: false,
            score: 0,
            hand: Vec::new(),
            has_drawn: false,
            gone_out: false,
            last_turn_complete: false,
            laid: LaidMelds::default(),
        }
    }

    fn reset_for_round(&mut self) {
        self.hand.clear();
        self.ready = false;
        self.has_drawn = false;
        self.gone_out = false;
        self.last_turn_complete = false;
        self.laid = LaidMelds::default();
    }
}

#[derive(Debug, Clone)]
pub struct RoomState {
    pub code: String,
    pub created_at: OffsetDateTime,
    pub players: Vec<Player>,
    pub round: u8,
    pub status: RoomStatus,
    pub draw_pile: Vec<Card>,
    pub discard_pile: Vec<Card>,
    pub current_turn: Option<Uuid>,
    pub go_out_player: Option<Uuid>,
    pub turn_order: Vec<Uuid>,
    pub dealer_index: usize,
}

impl RoomState {
    pub fn new(code: String) -> Self {
        RoomState {
            code,
            created_at: OffsetDateTime::now_utc(),
            players: Vec::new(),
            round: 1,
            status: RoomStatus::Lobby,
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            current_turn: None,
            go_out_player: None,
            turn_order: Vec::new(),
            dealer_index: 0,
        }
    }

    pub fn cards_per_player(&self) -> u8 {
        self.round + 2
    }

    pub fn wild(&self) -> Rank {
        wild_rank(self.cards_per_player())
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn player_mut(&mut self, id: Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn add_player(&mut self, id: Uuid, name: String) {
        self.players.push(Player::new(id, name));
    }

    /// Flip the ready flag; when everyone present (at least two players) is
    /// ready, the round starts immediately.
    pub fn toggle_ready(&mut self, id: Uuid) -> Outcome {
        if self.status != RoomStatus::Lobby {
            return Outcome::Ignored;
        }
        let Some(player) = self.player_mut(id) else {
            return Outcome::Ignored;
        };
        player.ready = !player.ready;
        if self.players.len() >= MIN_PLAYERS && self.players.iter().all(|p| p.ready) {
            self.start_round();
        }
        Outcome::Applied
    }

    /// Deal a fresh round: new shuffled double deck, round+2 cards each dealt
    /// round-robin, one starter card face up, first turn to the seat after
    /// the dealer.
    pub fn start_round(&mut self) {
        let mut deck = build_deck();
        shuffle(&mut deck, &mut rand::thread_rng());
        self.draw_pile = deck;
        self.discard_pile.clear();
        self.status = RoomStatus::Playing;
        self.go_out_player = None;
        for p in &mut self.players {
            p.reset_for_round();
        }

        for _ in 0..self.cards_per_player() {
            for i in 0..self.players.len() {
                if let Some(card) = self.draw_pile.pop() {
                    self.players[i].hand.push(card);
                }
            }
        }
        if let Some(starter) = self.draw_pile.pop() {
            self.discard_pile.push(starter);
        }

        self.turn_order = self.players.iter().map(|p| p.id).collect();
        let dealer = self.dealer_index % self.players.len();
        let first = (dealer + 1) % self.players.len();
        self.current_turn = Some(self.players[first].id);
    }

    /// When the draw pile runs dry, everything but the top discard is
    /// shuffled back in; the top card stays as a singleton discard pile.
    fn reshuffle_if_needed(&mut self) {
        if self.draw_pile.is_empty() && self.discard_pile.len() > 1 {
            let top = self.discard_pile.pop().unwrap();
            let mut rest = std::mem::take(&mut self.discard_pile);
            shuffle(&mut rest, &mut rand::thread_rng());
            self.draw_pile = rest;
            self.discard_pile.push(top);
        }
    }

    pub fn draw(&mut self, id: Uuid, source: DrawSource) -> Outcome {
        if self.status != RoomStatus::Playing || self.current_turn != Some(id) {
            return Outcome::Ignored;
        }
        match self.player(id) {
            Some(p) if !p.has_drawn => {}
            _ => return Outcome::Ignored,
        }
        self.reshuffle_if_needed();
        let card = match source {
            DrawSource::Draw => self.draw_pile.pop(),
            DrawSource::Discard => self.discard_pile.pop(),
        };
        let Some(card) = card else {
            return Outcome::Ignored;
        };
        let player = self.player_mut(id).expect("checked above");
        player.hand.push(card);
        player.has_drawn = true;
        Outcome::Applied
    }

    pub fn discard(&mut self, id: Uuid, card_id: Uuid) -> Outcome {
        if self.status != RoomStatus::Playing || self.current_turn != Some(id) {
            return Outcome::Ignored;
        }
        let go_out_active = self.go_out_player.is_some();
        let went_out_here = self.go_out_player == Some(id);
        let Some(player) = self.player_mut(id) else {
            return Outcome::Ignored;
        };
        if !player.has_drawn {
            return Outcome::Ignored;
        }
        let Some(index) = player.hand.iter().position(|c| c.id == card_id) else {
            return Outcome::Ignored;
        };
        let card = player.hand.remove(index);
        player.has_drawn = false;
        if go_out_active && !went_out_here {
            player.last_turn_complete = true;
        }
        self.discard_pile.push(card);

        if self.round_should_end() {
            self.end_round();
        } else {
            self.advance_turn();
        }
        Outcome::Applied
    }

    /// Validate and record melds; with `mark_go_out`, also perform the
    /// server-authoritative final discard and start the one-turn countdown
    /// for everyone else.
    pub fn submit_melds(
        &mut self,
        id: Uuid,
        melds: &[Vec<Uuid>],
        mark_go_out: bool,
    ) -> Result<Outcome, SubmitError> {
        if self.status != RoomStatus::Playing {
            return Ok(Outcome::Ignored);
        }
        let Some(player) = self.player(id) else {
            return Ok(Outcome::Ignored);
        };
        if mark_go_out {
            if self.current_turn != Some(id) {
                return Err(SubmitError::GoOutOutOfTurn);
            }
            if !player.has_drawn {
                return Err(SubmitError::GoOutBeforeDraw);
            }
        }
        let laid = validate_melds(&player.hand, melds, self.wild())?;

        if mark_go_out {
            let leftover: Vec<Card> = player
                .hand
                .iter()
                .filter(|c| !laid.ids.contains(&c.id))
                .copied()
                .collect();
            if leftover.len() != 1 {
                return Err(SubmitError::WrongLeftoverCount);
            }
            let last = leftover[0];

            let first_go_out = self.go_out_player.is_none();
            let player = self.player_mut(id).expect("checked above");
            player.laid = laid;
            player.hand.retain(|c| c.id != last.id);
            player.has_drawn = false;
            player.gone_out = true;
            player.last_turn_complete = true;
            self.discard_pile.push(last);
            if first_go_out {
                self.go_out_player = Some(id);
                for p in &mut self.players {
                    if p.id != id {
                        p.last_turn_complete = false;
                    }
                }
            }

            if self.round_should_end() {
                self.end_round();
            } else {
                self.advance_turn();
            }
        } else {
            self.player_mut(id).expect("checked above").laid = laid;
        }
        Ok(Outcome::Applied)
    }

    /// The round ends once a go-out is active and every other surviving
    /// player has taken their final turn.
    fn round_should_end(&self) -> bool {
        self.go_out_player.is_some()
            && self.players.iter().all(|p| p.gone_out || p.last_turn_complete)
    }

    /// Move the turn pointer to the next eligible seat, skipping players who
    /// have gone out and, during the countdown, players whose final turn is
    /// already complete. The new turn holder starts un-drawn.
    pub fn advance_turn(&mut self) {
        if self.turn_order.is_empty() {
            self.current_turn = None;
            return;
        }
        let start = self
            .current_turn
            .and_then(|cur| self.turn_order.iter().position(|id| *id == cur))
            .map(|i| i + 1)
            .unwrap_or(0);
        let countdown = self.go_out_player.is_some();
        for offset in 0..self.turn_order.len() {
            let id = self.turn_order[(start + offset) % self.turn_order.len()];
            let Some(player) = self.player_mut(id) else {
                continue;
            };
            if player.gone_out || (countdown && player.last_turn_complete) {
                continue;
            }
            player.has_drawn = false;
            self.current_turn = Some(id);
            return;
        }
        self.current_turn = None;
    }

    /// Score leftovers, advance the round counter and rotate the dealer.
    /// After round 11 the room is finished; otherwise it returns to the
    /// lobby and waits for everyone to re-ready.
    pub fn end_round(&mut self) {
        let wild = self.wild();
        for player in &mut self.players {
            let penalty: u32 = player
                .hand
                .iter()
                .filter(|c| !player.laid.ids.contains(&c.id))
                .map(|c| card_value(c, wild))
                .sum();
            player.score += penalty;
            player.hand.clear();
            player.has_drawn = false;
        }
        self.round += 1;
        self.status = if self.round > TOTAL_ROUNDS {
            RoomStatus::Finished
        } else {
            RoomStatus::Lobby
        };
        self.current_turn = None;
        if !self.players.is_empty() {
            self.dealer_index = (self.dealer_index + 1) % self.players.len();
        }
    }

    /// Drop a departed player. Repairs the turn pointer if they held it and
    /// re-checks the round-end condition so a disconnect during the go-out
    /// countdown cannot stall the room. Returns whether the room is now
    /// empty (and should be torn down).
    pub fn remove_player(&mut self, id: Uuid) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != id);
        if self.players.len() == before {
            return self.players.is_empty();
        }
        if self.players.is_empty() {
            return true;
        }
        self.turn_order.retain(|t| *t != id);
        if self.current_turn == Some(id) {
            // The departed id is gone from turn_order, so advance scans from
            // the front of the order.
            self.current_turn = None;
            self.advance_turn();
        }
        if self.status == RoomStatus::Playing && self.round_should_end() {
            self.end_round();
        }
        false
    }

    /// Administrative reset: back to the lobby at round 1 with zeroed scores
    /// and empty piles. Refused once the game has finished.
    pub fn reset(&mut self) -> Outcome {
        if self.status == RoomStatus::Finished {
            return Outcome::Ignored;
        }
        self.status = RoomStatus::Lobby;
        self.round = 1;
        self.dealer_index = 0;
        self.draw_pile.clear();
        self.discard_pile.clear();
        self.current_turn = None;
        self.go_out_player = None;
        self.turn_order.clear();
        for p in &mut self.players {
            p.reset_for_round();
            p.score = 0;
        }
        Outcome::Applied
    }
}
