//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::game::{
    GameSettings,
    constants::{DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, DEFAULT_STARTING_STACK, MAX_PLAYERS},
    entities::Usd,
};

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Maximum number of seated players (default: 10)
    pub max_players: usize,

    /// Chips each player receives on joining
    pub starting_stack: Usd,

    /// Small blind amount
    pub small_blind: Usd,

    /// Big blind amount, also the minimum opening raise
    pub big_blind: Usd,

    /// Idle time before the player holding the turn is folded. `None`
    /// waits forever.
    pub action_timeout_ms: Option<u64>,

    /// Fixed shuffle seed for reproducible hands
    pub deck_seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_players: MAX_PLAYERS,
            starting_stack: DEFAULT_STARTING_STACK,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            action_timeout_ms: None,
            deck_seed: None,
        }
    }
}

/// Why a [`TableConfig`] was rejected.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TableConfigError {
    #[error("table name can't be empty")]
    EmptyName,
    #[error("small blind must be at least 1")]
    ZeroSmallBlind,
    #[error("big blind ({big}) can't be less than the small blind ({small})")]
    BigBlindBelowSmall { small: Usd, big: Usd },
    #[error("max players must be between 2 and {max}, got {0}", max = MAX_PLAYERS)]
    SeatCount(usize),
    #[error("starting stack ({stack}) must cover the big blind ({big})")]
    ShortStack { stack: Usd, big: Usd },
    #[error("{seats} stacks of {stack} chips don't fit in a chip count")]
    ChipOverflow { stack: Usd, seats: usize },
    #[error("action timeout must be positive")]
    ZeroTimeout,
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), TableConfigError> {
        if self.name.trim().is_empty() {
            return Err(TableConfigError::EmptyName);
        }

        if self.small_blind == 0 {
            return Err(TableConfigError::ZeroSmallBlind);
        }

        if self.big_blind < self.small_blind {
            return Err(TableConfigError::BigBlindBelowSmall {
                small: self.small_blind,
                big: self.big_blind,
            });
        }

        if self.max_players < 2 || self.max_players > MAX_PLAYERS {
            return Err(TableConfigError::SeatCount(self.max_players));
        }

        if self.starting_stack < self.big_blind {
            return Err(TableConfigError::ShortStack {
                stack: self.starting_stack,
                big: self.big_blind,
            });
        }

        // Pots and chip totals are summed in `Usd`.
        let table_chips = u64::from(self.starting_stack) * self.max_players as u64;
        if table_chips > u64::from(Usd::MAX) {
            return Err(TableConfigError::ChipOverflow {
                stack: self.starting_stack,
                seats: self.max_players,
            });
        }

        if self.action_timeout_ms == Some(0) {
            return Err(TableConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Turn timeout, if one is configured
    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_ms.map(Duration::from_millis)
    }

    /// Engine settings for this table
    pub fn game_settings(&self) -> GameSettings {
        let settings = GameSettings::new(
            self.max_players,
            self.starting_stack,
            self.small_blind,
            self.big_blind,
        );
        match self.deck_seed {
            Some(seed) => settings.with_seed(seed),
            None => settings,
        }
    }
}
