//! Card identity, deck construction, wild-rank derivation and scoring values.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ranks in play. Five Crowns decks have no aces or twos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    Joker,
}

pub const RANK_ORDER: [Rank; 11] = [
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
];

impl Rank {
    /// Position in run order (3 low .. K high). None for Jokers, which have
    /// no fixed position.
    pub fn index(self) -> Option<usize> {
        RANK_ORDER.iter().position(|r| *r == self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Stars,
    Diamonds,
    Hearts,
    Spades,
    Clubs,
    Joker,
}

pub const SUITS: [Suit; 5] = [Suit::Stars, Suit::Diamonds, Suit::Hearts, Suit::Spades, Suit::Clubs];

/// A physical card. Two decks are in play, so (rank, suit) pairs repeat;
/// identity is the `id` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    fn new(rank: Rank, suit: Suit) -> Self {
        Card { id: Uuid::new_v4(), rank, suit }
    }
}

/// Two 58-card decks: 5 suits x 11 ranks plus 3 jokers per deck, 116 total.
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(116);
    for _ in 0..2 {
        for suit in SUITS {
            for rank in RANK_ORDER {
                deck.push(Card::new(rank, suit));
            }
        }
        for _ in 0..3 {
            deck.push(Card::new(Rank::Joker, Suit::Joker));
        }
    }
    deck
}

/// Fisher-Yates via `SliceRandom`; callers pass the RNG so tests can seed it.
pub fn shuffle<R: Rng>(deck: &mut Vec<Card>, rng: &mut R) {
    deck.shuffle(rng);
}

/// Wild rank for a round dealing `cards_per_player` cards (round + 2, so
/// 3..=13 over the 11 rounds).
pub fn wild_rank(cards_per_player: u8) -> Rank {
    match cards_per_player {
        3 => Rank::Three,
        4 => Rank::Four,
        5 => Rank::Five,
        6 => Rank::Six,
        7 => Rank::Seven,
        8 => Rank::Eight,
        9 => Rank::Nine,
        10 => Rank::Ten,
        11 => Rank::Jack,
        12 => Rank::Queen,
        _ => Rank::King,
    }
}

pub fn is_wild(card: &Card, wild: Rank) -> bool {
    card.rank == Rank::Joker || card.rank == wild
}

/// Penalty value of a leftover (unmelded) card at round end.
pub fn card_value(card: &Card, wild: Rank) -> u32 {
    if card.rank == Rank::Joker {
        return 50;
    }
    if card.rank == wild {
        return 20;
    }
    match card.rank {
        Rank::Three => 3,
        Rank::Four => 4,
        Rank::Five => 5,
        Rank::Six => 6,
        Rank::Seven => 7,
        Rank::Eight => 8,
        Rank::Nine => 9,
        Rank::Ten => 10,
        Rank::Jack => 11,
        Rank::Queen => 12,
        Rank::King => 13,
        Rank::Joker => unreachable!(),
    }
}
