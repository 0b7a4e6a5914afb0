use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    constants,
    functional::HandRank,
    state_machine::GameError,
    states::Stage,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

pub const ACE: Value = 14;
pub const KING: Value = 13;
pub const QUEEN: Value = 12;
pub const JACK: Value = 11;

/// A card is a tuple of a value (two=2u8 ... ace=14u8) and a suit.
/// Aces only count as one when completing a wheel straight, and the
/// evaluator handles that case itself.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value: &str = match self.0 {
            ACE => "A",
            KING => "K",
            QUEEN => "Q",
            JACK => "J",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

/// A draw sequence over the 52 distinct cards. Cards are consumed from the
/// front and never handed out twice.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    deck_idx: usize,
}

impl Deck {
    /// A freshly permuted deck. Supplying a seed makes the permutation
    /// reproducible.
    #[must_use]
    pub fn shuffled(seed: Option<u64>) -> Self {
        let mut deck = Self::default();
        match seed {
            Some(seed) => deck.cards.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => deck.cards.shuffle(&mut rand::rng()),
        }
        deck
    }

    /// Take the next `n` cards in order.
    pub fn draw(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(GameError::DeckExhausted {
                wanted: n,
                remaining,
            });
        }
        let cards = self.cards[self.deck_idx..self.deck_idx + n].to_vec();
        self.deck_idx += n;
        Ok(cards)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

/// Unshuffled, ordered by value then suit.
impl Default for Deck {
    fn default() -> Self {
        let cards = (2..=ACE)
            .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
            .collect();
        Self { cards, deck_idx: 0 }
    }
}

/// Type alias for whole chips. Stacks, bets and pots are all whole chips.
pub type Usd = u32;

/// Type alias for seat positions during the game. Seat order is join order.
pub type SeatIndex = usize;

/// Stable external identity of a seated player, supplied by the transport
/// when the player joins (typically a connection id).
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Whitespace becomes underscores and the result is capped at half the
/// maximum input length.
pub fn normalize_name(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .take(constants::MAX_USER_INPUT_LENGTH / 2)
        .collect()
}

/// A betting action submitted by the player holding the turn.
///
/// `Raise::amount` is the player's new total contribution for the round
/// ("raise to"), not the increment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    AllIn,
    Call,
    Check,
    Fold,
    Raise { amount: Usd },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr: &str = match self {
            Self::AllIn => "goes all-in",
            Self::Call => "calls",
            Self::Check => "checks",
            Self::Fold => "folds",
            Self::Raise { amount } => &format!("raises to ${amount}"),
        };
        write!(f, "{repr}")
    }
}

/// Where a player stands in the current hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerState {
    // Player put in their whole stack.
    AllIn,
    Call,
    Check,
    // Player forfeited their stake in the pot.
    Fold,
    Raise,
    // Player had no chips when the hand started.
    SitOut,
    // Player is in the hand and hasn't acted this round.
    Wait,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-in",
            Self::Call => "call",
            Self::Check => "check",
            Self::Fold => "folded",
            Self::Raise => "raise",
            Self::SitOut => "sitting out",
            Self::Wait => "waiting",
        };
        write!(f, "{repr:7}")
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub chips: Usd,
    pub cards: Vec<Card>,
    /// Chips put in during the current betting round.
    pub round_bet: Usd,
    pub state: PlayerState,
    pub seat_idx: SeatIndex,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: &str, chips: Usd, seat_idx: SeatIndex) -> Self {
        Self {
            id,
            name: normalize_name(name),
            chips,
            cards: Vec::with_capacity(2),
            round_bet: 0,
            state: PlayerState::Wait,
            seat_idx,
        }
    }

    /// Prepare for a new hand. Busted players sit the hand out.
    pub fn reset(&mut self) {
        self.cards.clear();
        self.round_bet = 0;
        self.state = if self.chips == 0 {
            PlayerState::SitOut
        } else {
            PlayerState::Wait
        };
    }

    #[must_use]
    pub fn is_folded(&self) -> bool {
        matches!(self.state, PlayerState::Fold | PlayerState::SitOut)
    }

    #[must_use]
    pub fn is_all_in(&self) -> bool {
        self.state == PlayerState::AllIn
    }

    /// Still in the hand and still has chips to act with.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.is_folded() && !self.is_all_in()
    }

    /// Move up to `amount` chips from the stack into the current round,
    /// returning what was actually moved.
    pub fn commit(&mut self, amount: Usd) -> Usd {
        let paid = amount.min(self.chips);
        self.chips -= paid;
        self.round_bet += paid;
        paid
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub chips: Usd,
    pub round_bet: Usd,
    pub state: PlayerState,
    pub folded: bool,
    pub all_in: bool,
    /// Empty unless the cards are visible to whoever receives the view.
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotView {
    pub amount: Usd,
    pub eligible: Vec<PlayerId>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerView {
    pub player_id: PlayerId,
    pub amount: Usd,
    /// Absent when everyone else folded and no hand was shown.
    pub hand: Option<HandRank>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteView {
    pub requester: PlayerId,
    pub accepted: Vec<PlayerId>,
    pub pending: Vec<PlayerId>,
}

/// Full, immutable picture of a table after an action has been processed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub hand_number: u64,
    pub stage: Stage,
    pub board: Vec<Card>,
    pub players: Vec<PlayerView>,
    pub dealer: Option<PlayerId>,
    pub current_turn: Option<PlayerId>,
    pub highest_bet: Usd,
    pub pots: Vec<PotView>,
    pub pot_total: Usd,
    pub winners: Vec<WinnerView>,
    pub restart_vote: Option<VoteView>,
}
