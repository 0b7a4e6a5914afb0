//! Hand evaluation.
//!
//! A hand is scored into a [`HandRank`]: its category followed by five
//! tiebreak values ordered by importance. Comparing two ranks with the
//! derived ordering ranks the hands.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::{ACE, Card, Value},
    state_machine::GameError,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// Category plus kickers. Values are grouped by multiplicity and then by
/// value, so `[K, K, K, 7, 7]` is kings full of sevens and a wheel is
/// `[5, 4, 3, 2, 1]`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct HandRank {
    pub rank: Rank,
    pub values: [Value; 5],
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.rank, self.values)
    }
}

/// Score the best five-card hand out of 5 to 7 cards.
pub fn evaluate(cards: &[Card]) -> Result<HandRank, GameError> {
    if !(5..=7).contains(&cards.len()) {
        return Err(GameError::InvalidHand(cards.len()));
    }

    let n = cards.len();
    let mut best: Option<HandRank> = None;
    // At most C(7, 5) = 21 subsets.
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                for d in c + 1..n {
                    for e in d + 1..n {
                        let rank = eval_five([cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.is_none_or(|best| rank > best) {
                            best = Some(rank);
                        }
                    }
                }
            }
        }
    }
    best.ok_or(GameError::InvalidHand(n))
}

fn eval_five(cards: [Card; 5]) -> HandRank {
    let mut values: Vec<Value> = cards.iter().map(|c| c.0).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.1 == cards[0].1);
    let straight_high = straight_high(&values);

    if let Some(high) = straight_high {
        let values = straight_values(high);
        let rank = if is_flush {
            Rank::StraightFlush
        } else {
            Rank::Straight
        };
        return HandRank { rank, values };
    }

    // (count, value) groups, biggest group first, then highest value.
    let mut groups: Vec<(usize, Value)> = Vec::with_capacity(5);
    for &value in &values {
        match groups.iter_mut().find(|(_, v)| *v == value) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, value)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let mut ordered = [0; 5];
    let mut i = 0;
    for &(count, value) in &groups {
        for _ in 0..count {
            ordered[i] = value;
            i += 1;
        }
    }

    let rank = match (groups[0].0, groups.get(1).map(|g| g.0)) {
        (4, _) => Rank::FourOfAKind,
        (3, Some(2)) => Rank::FullHouse,
        _ if is_flush => Rank::Flush,
        (3, _) => Rank::ThreeOfAKind,
        (2, Some(2)) => Rank::TwoPair,
        (2, _) => Rank::OnePair,
        _ => Rank::HighCard,
    };
    HandRank {
        rank,
        values: ordered,
    }
}

/// High card of the straight formed by five values sorted descending,
/// with the ace playing low for the wheel.
fn straight_high(values: &[Value]) -> Option<Value> {
    let distinct = values.windows(2).all(|w| w[0] != w[1]);
    if !distinct {
        return None;
    }
    if values[0] - values[4] == 4 {
        return Some(values[0]);
    }
    if values == [ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

fn straight_values(high: Value) -> [Value; 5] {
    [high, high - 1, high - 2, high - 3, high - 4]
}

/// Indices of every rank tied for best. Empty input yields no winners.
pub fn argmax(ranks: &[HandRank]) -> Vec<usize> {
    let Some(best) = ranks.iter().max() else {
        return Vec::new();
    };
    ranks
        .iter()
        .enumerate()
        .filter(|(_, rank)| *rank == best)
        .map(|(i, _)| i)
        .collect()
}
