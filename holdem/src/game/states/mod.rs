//! Stage tags for the table lifecycle.
//!
//! A table sits in `Lobby` until the first hand starts, walks through the
//! four betting stages, reaches `Showdown` after the river round closes, and
//! rests in `HandComplete` until a restart vote deals the next hand.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Lobby,
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
    HandComplete,
}

impl Stage {
    /// Stages that have an open (or closable) betting round.
    #[must_use]
    pub fn is_betting(&self) -> bool {
        matches!(self, Self::PreFlop | Self::Flop | Self::Turn | Self::River)
    }

    /// Number of community cards visible in this stage.
    #[must_use]
    pub fn board_size(&self) -> usize {
        match self {
            Self::Lobby | Self::PreFlop => 0,
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River | Self::Showdown | Self::HandComplete => 5,
        }
    }

    /// The stage a completed betting round advances into.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::PreFlop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => Some(Self::Showdown),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Lobby => "lobby",
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::HandComplete => "hand complete",
        };
        write!(f, "{repr}")
    }
}
