//! Table limits and defaults.

use super::entities::Usd;

/// Hard seat limit. Ten players need at most 2 * 10 + 5 = 25 cards, so the
/// deck can never run dry under correct stage sequencing.
pub const MAX_PLAYERS: usize = 10;

/// Longest display name accepted from a client, in characters.
pub const MAX_USER_INPUT_LENGTH: usize = 32;

pub const DEFAULT_STARTING_STACK: Usd = 1000;
pub const DEFAULT_BIG_BLIND: Usd = DEFAULT_STARTING_STACK / 100;
pub const DEFAULT_SMALL_BLIND: Usd = DEFAULT_BIG_BLIND / 2;

/// Community cards drawn when entering the flop, turn and river.
pub const FLOP_CARDS: usize = 3;
pub const TURN_CARDS: usize = 1;
pub const RIVER_CARDS: usize = 1;
