//! Pot ledger: per-seat contributions for one hand, side pot construction,
//! and payouts.

use std::collections::BTreeMap;

use super::{
    entities::{Player, SeatIndex, Usd},
    functional::HandRank,
};

/// A main or side pot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pot {
    pub amount: Usd,
    /// Non-folded seats that can win this pot, in seat order.
    pub eligible: Vec<SeatIndex>,
}

/// Chips each seat has put in during the current hand.
#[derive(Clone, Debug, Default)]
pub struct PotLedger {
    contributions: BTreeMap<SeatIndex, Usd>,
}

impl PotLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contribute(&mut self, seat: SeatIndex, amount: Usd) {
        if amount == 0 {
            return;
        }
        *self.contributions.entry(seat).or_default() += amount;
    }

    #[must_use]
    pub fn contribution(&self, seat: SeatIndex) -> Usd {
        self.contributions.get(&seat).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> Usd {
        self.contributions.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn clear(&mut self) {
        self.contributions.clear();
    }

    /// Split the contributions into a main pot and side pots.
    ///
    /// Each distinct contribution level forms a pot holding, from every seat
    /// that reached the level, the slice between the previous level and this
    /// one. Folded seats pay in but are never eligible. A level whose
    /// contributors all folded has nobody to award it to, so its chips roll
    /// into the next pot with an eligible seat (or the last pot formed).
    #[must_use]
    pub fn compute_pots(&self, players: &[Player]) -> Vec<Pot> {
        let is_live = |seat: SeatIndex| players.get(seat).is_some_and(|p| !p.is_folded());

        let mut levels: Vec<Usd> = self
            .contributions
            .values()
            .copied()
            .filter(|&c| c > 0)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut pots: Vec<Pot> = Vec::with_capacity(levels.len());
        let mut previous = 0;
        let mut orphaned = 0;
        for level in levels {
            let contributors: Vec<SeatIndex> = self
                .contributions
                .iter()
                .filter(|(_, c)| **c >= level)
                .map(|(seat, _)| *seat)
                .collect();
            let amount = (level - previous) * contributors.len() as Usd;
            previous = level;

            let eligible: Vec<SeatIndex> =
                contributors.into_iter().filter(|&s| is_live(s)).collect();
            if eligible.is_empty() {
                orphaned += amount;
                continue;
            }
            pots.push(Pot {
                amount: amount + orphaned,
                eligible,
            });
            orphaned = 0;
        }
        if orphaned > 0
            && let Some(last) = pots.last_mut()
        {
            last.amount += orphaned;
        }
        pots
    }
}

/// Pay each pot to its best eligible hands.
///
/// `ranked` holds the showdown rank of every seat still in the hand.
/// `order` lists seats from the earliest to the latest to act; tied winners
/// split a pot evenly and the indivisible remainder goes to whichever of
/// them comes first in `order`. Returns chips won per seat, summing to the
/// total of `pots`.
#[must_use]
pub fn distribute(
    pots: &[Pot],
    ranked: &BTreeMap<SeatIndex, HandRank>,
    order: &[SeatIndex],
) -> BTreeMap<SeatIndex, Usd> {
    let mut payouts: BTreeMap<SeatIndex, Usd> = BTreeMap::new();
    for pot in pots {
        let best = pot.eligible.iter().filter_map(|s| ranked.get(s)).max();
        let mut winners: Vec<SeatIndex> = match best {
            Some(best) => pot
                .eligible
                .iter()
                .copied()
                .filter(|s| ranked.get(s) == Some(best))
                .collect(),
            // No ranked hands: everyone eligible shares.
            None => pot.eligible.clone(),
        };
        if winners.is_empty() {
            continue;
        }
        winners.sort_by_key(|s| order.iter().position(|o| o == s).unwrap_or(usize::MAX));

        let share = pot.amount / winners.len() as Usd;
        let remainder = pot.amount % winners.len() as Usd;
        for (i, seat) in winners.iter().enumerate() {
            let won = if i == 0 { share + remainder } else { share };
            *payouts.entry(*seat).or_default() += won;
        }
    }
    payouts
}
