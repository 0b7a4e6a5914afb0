//! Betting round state machine.
//!
//! A round is either awaiting an action from exactly one seat or complete.
//! Every action is validated in full before anything is mutated, so a
//! rejected action leaves players, ledger and round untouched.

use std::collections::BTreeSet;

use super::{
    entities::{Action, Player, PlayerState, SeatIndex, Usd},
    pot::PotLedger,
    state_machine::{GameError, IllegalAction},
};

/// Where a round stands after an accepted action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RoundStatus {
    AwaitingAction(SeatIndex),
    RoundComplete,
    /// Everyone else folded; the hand is over without a showdown.
    HandWon(SeatIndex),
}

#[derive(Clone, Debug)]
pub struct BettingRound {
    pub highest_bet: Usd,
    /// Smallest legal raise increment over `highest_bet`.
    pub min_raise: Usd,
    pub last_aggressor: Option<SeatIndex>,
    to_act: BTreeSet<SeatIndex>,
    current: Option<SeatIndex>,
}

impl BettingRound {
    /// Open a round with action starting at `first` (or the next seat after
    /// it that still owes an action).
    ///
    /// With at most one player able to act there's nobody to bet against, so
    /// the round opens already complete unless that player still has to
    /// match a bet.
    #[must_use]
    pub fn open(
        players: &[Player],
        first: SeatIndex,
        highest_bet: Usd,
        min_raise: Usd,
    ) -> Self {
        let mut to_act: BTreeSet<SeatIndex> = players
            .iter()
            .filter(|p| p.can_act())
            .map(|p| p.seat_idx)
            .collect();
        if to_act.len() <= 1 {
            to_act.retain(|&s| players[s].round_bet < highest_bet);
        }
        let current = next_seat(&to_act, first, players.len());
        Self {
            highest_bet,
            min_raise,
            last_aggressor: None,
            to_act,
            current,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<SeatIndex> {
        self.current
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current.is_none()
    }

    #[must_use]
    pub fn yet_to_act(&self) -> &BTreeSet<SeatIndex> {
        &self.to_act
    }

    #[must_use]
    pub fn status(&self) -> RoundStatus {
        match self.current {
            Some(seat) => RoundStatus::AwaitingAction(seat),
            None => RoundStatus::RoundComplete,
        }
    }

    /// Chips `seat` must add to stay in the round.
    #[must_use]
    pub fn to_call(&self, player: &Player) -> Usd {
        self.highest_bet.saturating_sub(player.round_bet)
    }

    /// Apply one action from `seat`.
    pub fn apply(
        &mut self,
        seat: SeatIndex,
        action: Action,
        players: &mut [Player],
        ledger: &mut PotLedger,
    ) -> Result<RoundStatus, GameError> {
        let player = players
            .get(seat)
            .ok_or(GameError::IllegalAction(IllegalAction::OutOfTurn))?;
        if player.is_folded() {
            return Err(IllegalAction::PlayerFolded.into());
        }
        let Some(current) = self.current else {
            return Err(IllegalAction::NoActionPending.into());
        };
        if current != seat {
            return Err(IllegalAction::OutOfTurn.into());
        }

        let step = self.validate(player, action)?;

        let player = &mut players[seat];
        let paid = player.commit(step.commit);
        ledger.contribute(seat, paid);
        player.state = if player.chips == 0 && step.state != PlayerState::Fold {
            PlayerState::AllIn
        } else {
            step.state
        };
        self.to_act.remove(&seat);

        if player.round_bet > self.highest_bet {
            let increment = player.round_bet - self.highest_bet;
            if increment >= self.min_raise {
                self.min_raise = increment;
            }
            self.highest_bet = player.round_bet;
            self.last_aggressor = Some(seat);
            self.to_act = players
                .iter()
                .filter(|p| p.can_act() && p.seat_idx != seat)
                .map(|p| p.seat_idx)
                .collect();
        }

        let mut live = players.iter().filter(|p| !p.is_folded());
        if let (Some(winner), None) = (live.next(), live.next()) {
            self.to_act.clear();
            self.current = None;
            return Ok(RoundStatus::HandWon(winner.seat_idx));
        }

        self.current = next_seat(&self.to_act, seat + 1, players.len());
        Ok(self.status())
    }

    /// Check an action against the round without touching anything.
    fn validate(&self, player: &Player, action: Action) -> Result<Step, GameError> {
        let to_call = self.to_call(player);
        let step = match action {
            Action::Check => {
                if to_call > 0 {
                    return Err(IllegalAction::CannotCheck { to_call }.into());
                }
                Step::new(0, PlayerState::Check)
            }
            Action::Call if to_call == 0 => Step::new(0, PlayerState::Check),
            Action::Call => Step::new(to_call.min(player.chips), PlayerState::Call),
            Action::Fold => Step::new(0, PlayerState::Fold),
            Action::AllIn => {
                let state = if player.round_bet + player.chips > self.highest_bet {
                    PlayerState::Raise
                } else {
                    PlayerState::Call
                };
                Step::new(player.chips, state)
            }
            Action::Raise { amount } => {
                if amount <= self.highest_bet {
                    return Err(IllegalAction::RaiseTooSmall {
                        min: self.highest_bet + self.min_raise,
                    }
                    .into());
                }
                let need = amount - player.round_bet;
                if need > player.chips {
                    return Err(IllegalAction::InsufficientFunds {
                        need,
                        stack: player.chips,
                    }
                    .into());
                }
                let all_in = need == player.chips;
                if amount - self.highest_bet < self.min_raise && !all_in {
                    return Err(IllegalAction::RaiseTooSmall {
                        min: self.highest_bet + self.min_raise,
                    }
                    .into());
                }
                Step::new(need, PlayerState::Raise)
            }
        };
        Ok(step)
    }
}

struct Step {
    commit: Usd,
    state: PlayerState,
}

impl Step {
    fn new(commit: Usd, state: PlayerState) -> Self {
        Self { commit, state }
    }
}

/// First seat in `to_act` at or after `from`, wrapping around the table.
fn next_seat(to_act: &BTreeSet<SeatIndex>, from: SeatIndex, num_seats: usize) -> Option<SeatIndex> {
    if num_seats == 0 {
        return None;
    }
    (0..num_seats)
        .map(|offset| (from + offset) % num_seats)
        .find(|seat| to_act.contains(seat))
}
