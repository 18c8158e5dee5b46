//! Pure validation of proposed melds (books and runs) against a hand.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use uuid::Uuid;

use crate::game::cards::{is_wild, Card, Rank};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeldError {
    #[error("Each meld must have at least 3 cards")]
    TooFewCards,
    #[error("Card used twice in melds")]
    CardReused,
    #[error("Card not in hand")]
    CardNotInHand,
    #[error("Invalid book or run")]
    NotBookOrRun,
}

/// Accepted submission: the cards consumed by the melds, and their ids for
/// fast membership checks at scoring time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidMelds {
    pub cards: Vec<Card>,
    pub ids: HashSet<Uuid>,
}

/// Validate a full submission against the player's current hand. Groups are
/// checked in order; the first violation rejects the whole submission and no
/// partial state is returned.
pub fn validate_melds(
    hand: &[Card],
    melds: &[Vec<Uuid>],
    wild: Rank,
) -> Result<LaidMelds, MeldError> {
    let by_id: HashMap<Uuid, &Card> = hand.iter().map(|c| (c.id, c)).collect();
    let mut used = HashSet::new();
    let mut laid = Vec::new();

    for meld in melds {
        if meld.len() < 3 {
            return Err(MeldError::TooFewCards);
        }
        let mut cards = Vec::with_capacity(meld.len());
        for id in meld {
            if !used.insert(*id) {
                return Err(MeldError::CardReused);
            }
            let card = *by_id.get(id).ok_or(MeldError::CardNotInHand)?;
            cards.push(*card);
        }
        if !is_valid_book(&cards, wild) && !is_valid_run(&cards, wild) {
            return Err(MeldError::NotBookOrRun);
        }
        laid.extend(cards);
    }

    Ok(LaidMelds { cards: laid, ids: used })
}

/// Book: every non-wild card shares one rank. All-wild groups pass.
fn is_valid_book(cards: &[Card], wild: Rank) -> bool {
    let mut natural = cards.iter().filter(|c| !is_wild(c, wild));
    let Some(first) = natural.next() else { return true };
    natural.all(|c| c.rank == first.rank)
}

/// Run: every non-wild card shares one suit, and after sorting by rank the
/// gaps between consecutive cards can be filled by the group's wilds. A
/// duplicated rank makes the run unfillable. All-wild groups pass.
fn is_valid_run(cards: &[Card], wild: Rank) -> bool {
    let mut natural: Vec<&Card> = cards.iter().filter(|c| !is_wild(c, wild)).collect();
    let Some(first) = natural.first() else { return true };
    let suit = first.suit;
    if !natural.iter().all(|c| c.suit == suit) {
        return false;
    }
    natural.sort_by_key(|c| c.rank.index());
    let mut needed = 0;
    for pair in natural.windows(2) {
        // Non-wild cards always have a rank index.
        let prev = pair[0].rank.index().unwrap();
        let cur = pair[1].rank.index().unwrap();
        if cur == prev {
            return false;
        }
        needed += cur - prev - 1;
    }
    let wilds = cards.iter().filter(|c| is_wild(c, wild)).count();
    needed <= wilds
}
