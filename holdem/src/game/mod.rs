//! Poker game engine: cards, hand evaluation, pots, betting rounds and the
//! table session that ties them together.
//!
//! Everything in here is synchronous and single-owner. Concurrency lives in
//! [`crate::table`].

pub mod betting;
pub mod constants;
pub mod entities;
pub mod functional;
pub mod pot;
pub mod restart;
pub mod state_machine;
pub mod states;

pub use state_machine::{
    GameError, GameSettings, IllegalAction, InvalidTransition, StartOutcome, TableSession,
};
