//! The game engine: cards, meld validation, the room state machine and the
//! per-player view projection. Everything here is transport-free.

pub mod cards;
pub mod melds;
pub mod room;
pub mod view;
