//! Table session: the aggregate that owns seating, the deck, the board,
//! the active betting round, the pot ledger and the restart vote.
//!
//! Every mutating method either succeeds completely or returns an error and
//! leaves the session exactly as it was. The single exception is a
//! [`GameError::DeckExhausted`] during a hand, which aborts the hand and
//! restores every stack to its pre-hand value.

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::{
    betting::{BettingRound, RoundStatus},
    constants::{
        DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, DEFAULT_STARTING_STACK, FLOP_CARDS, MAX_PLAYERS,
        RIVER_CARDS, TURN_CARDS,
    },
    entities::{
        Action, Card, Deck, Player, PlayerId, PlayerState, PlayerView, PotView, SeatIndex,
        TableSnapshot, Usd, WinnerView, normalize_name,
    },
    functional::{HandRank, evaluate},
    pot::{PotLedger, distribute},
    restart::{RestartVote, VoteProgress},
    states::Stage,
};

/// Reasons a betting or voting action is refused.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum IllegalAction {
    #[error("not your turn")]
    OutOfTurn,
    #[error("you already folded")]
    PlayerFolded,
    #[error("no action is pending")]
    NoActionPending,
    #[error("can't check facing ${to_call}")]
    CannotCheck { to_call: Usd },
    #[error("raise must be to at least ${min}")]
    RaiseTooSmall { min: Usd },
    #[error("need ${need} but only have ${stack}")]
    InsufficientFunds { need: Usd, stack: Usd },
    #[error("already voted")]
    AlreadyVoted,
    #[error("wasn't seated when the vote opened")]
    NotEligibleToVote,
}

/// Reasons a lifecycle step (deal, showdown, start, vote) is refused.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum InvalidTransition {
    #[error("betting round is still open")]
    RoundInProgress,
    #[error("need 2+ players with chips")]
    NotEnoughPlayers,
    #[error("a hand is in progress")]
    HandInProgress,
    #[error("no hand in progress")]
    NoHandInProgress,
    #[error("can't deal the {requested} from the {current}")]
    WrongStage { current: Stage, requested: Stage },
    #[error("hand isn't ready for showdown")]
    NotAtShowdown,
    #[error("no restart vote is open")]
    NoVoteOpen,
    #[error("a restart vote is already open")]
    VoteInProgress,
}

/// Errors that can occur while operating a table
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("illegal action: {0}")]
    IllegalAction(#[from] IllegalAction),
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] InvalidTransition),
    #[error("deck exhausted: wanted {wanted} card(s), {remaining} left")]
    DeckExhausted { wanted: usize, remaining: usize },
    #[error("table is full")]
    TableFull,
    #[error("game already started")]
    AlreadyStarted,
    #[error("already seated")]
    AlreadySeated,
    #[error("name can't be empty")]
    EmptyName,
    #[error("not seated at this table")]
    UnknownPlayer,
    #[error("can't evaluate a hand of {0} card(s)")]
    InvalidHand(usize),
}

/// Game configuration settings
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub max_players: usize,
    pub starting_stack: Usd,
    pub small_blind: Usd,
    pub big_blind: Usd,
    /// Makes every shuffle reproducible. Each hand shuffles with this seed
    /// offset by the hand number.
    pub deck_seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(
            MAX_PLAYERS,
            DEFAULT_STARTING_STACK,
            DEFAULT_SMALL_BLIND,
            DEFAULT_BIG_BLIND,
        )
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(
        max_players: usize,
        starting_stack: Usd,
        small_blind: Usd,
        big_blind: Usd,
    ) -> Self {
        Self {
            max_players,
            starting_stack,
            small_blind,
            big_blind,
            deck_seed: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.deck_seed = Some(seed);
        self
    }
}

/// What a start request led to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartOutcome {
    HandStarted,
    VoteOpened,
}

#[derive(Debug)]
pub struct TableSession {
    settings: GameSettings,
    stage: Stage,
    /// Seating order is join order.
    players: Vec<Player>,
    /// Community cards shared amongst all players.
    board: Vec<Card>,
    deck: Deck,
    dealer_idx: Option<SeatIndex>,
    round: Option<BettingRound>,
    ledger: PotLedger,
    winners: Vec<WinnerView>,
    restart: RestartVote,
    hand_number: u64,
    /// Stacks as they were before blinds, for aborting a hand.
    stacks_at_hand_start: Vec<Usd>,
    /// Whether hole cards have been shown this hand.
    revealed: bool,
    /// Bumped on every accepted mutation.
    version: u64,
}

impl Default for TableSession {
    fn default() -> Self {
        GameSettings::default().into()
    }
}

impl From<GameSettings> for TableSession {
    fn from(settings: GameSettings) -> Self {
        Self {
            players: Vec::with_capacity(settings.max_players),
            settings,
            stage: Stage::Lobby,
            board: Vec::with_capacity(5),
            deck: Deck::default(),
            dealer_idx: None,
            round: None,
            ledger: PotLedger::new(),
            winners: Vec::new(),
            restart: RestartVote::new(),
            hand_number: 0,
            stacks_at_hand_start: Vec::new(),
            revealed: false,
            version: 0,
        }
    }
}

impl TableSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.board
    }

    #[must_use]
    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn round(&self) -> Option<&BettingRound> {
        self.round.as_ref()
    }

    #[must_use]
    pub fn ledger(&self) -> &PotLedger {
        &self.ledger
    }

    #[must_use]
    pub fn winners(&self) -> &[WinnerView] {
        &self.winners
    }

    #[must_use]
    pub fn restart_vote(&self) -> &RestartVote {
        &self.restart
    }

    #[must_use]
    pub fn seat_of(&self, id: &PlayerId) -> Option<SeatIndex> {
        self.players.iter().position(|p| &p.id == id)
    }

    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Player holding the turn, if a betting round is waiting on someone.
    #[must_use]
    pub fn current_turn(&self) -> Option<&PlayerId> {
        let seat = self.round.as_ref()?.current()?;
        self.players.get(seat).map(|p| &p.id)
    }

    /// Whether the open betting round (if any) has finished.
    #[must_use]
    pub fn is_round_complete(&self) -> bool {
        self.round.as_ref().is_none_or(BettingRound::is_complete)
    }

    /// Chips in stacks plus chips in the pot.
    #[must_use]
    pub fn total_chips(&self) -> Usd {
        self.players.iter().map(|p| p.chips).sum::<Usd>() + self.ledger.total()
    }

    fn seated_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id.clone())
    }

    fn funded_count(&self) -> usize {
        self.players.iter().filter(|p| p.chips > 0).count()
    }

    /// Seat a new player. Only possible while the table is in the lobby.
    pub fn join(&mut self, id: PlayerId, name: &str) -> Result<SeatIndex, GameError> {
        if self.stage != Stage::Lobby {
            return Err(GameError::AlreadyStarted);
        }
        if self.seat_of(&id).is_some() {
            return Err(GameError::AlreadySeated);
        }
        if self.players.len() >= self.settings.max_players {
            return Err(GameError::TableFull);
        }
        if normalize_name(name.trim()).is_empty() {
            return Err(GameError::EmptyName);
        }

        let seat_idx = self.players.len();
        let player = Player::new(id, name.trim(), self.settings.starting_stack, seat_idx);
        info!("{} ({}) sat down in seat {seat_idx}", player.name, player.id);
        self.players.push(player);
        self.version += 1;
        Ok(seat_idx)
    }

    /// Ask to deal. From the lobby this deals the first hand directly; once
    /// a hand is complete it opens a restart vote instead.
    pub fn request_start(&mut self, requester: &PlayerId) -> Result<StartOutcome, GameError> {
        if self.seat_of(requester).is_none() {
            return Err(GameError::UnknownPlayer);
        }
        match self.stage {
            Stage::Lobby => {
                self.start_hand()?;
                Ok(StartOutcome::HandStarted)
            }
            Stage::HandComplete => {
                if self.funded_count() < 2 {
                    return Err(InvalidTransition::NotEnoughPlayers.into());
                }
                let mut restart = self.restart.clone();
                match restart.request(requester, self.seated_ids())? {
                    VoteProgress::Approved => {
                        self.start_hand()?;
                        Ok(StartOutcome::HandStarted)
                    }
                    _ => {
                        info!("{requester} asked to deal the next hand");
                        self.restart = restart;
                        self.version += 1;
                        Ok(StartOutcome::VoteOpened)
                    }
                }
            }
            _ => Err(InvalidTransition::HandInProgress.into()),
        }
    }

    /// Cast a restart ballot. Unanimous approval deals the next hand.
    pub fn respond_start(
        &mut self,
        voter: &PlayerId,
        accept: bool,
    ) -> Result<VoteProgress, GameError> {
        if self.seat_of(voter).is_none() {
            return Err(GameError::UnknownPlayer);
        }
        let mut restart = self.restart.clone();
        let progress = restart.cast(voter, accept)?;
        match progress {
            VoteProgress::Approved => {
                self.start_hand()?;
                info!("restart approved, dealing hand {}", self.hand_number);
            }
            VoteProgress::Declined => {
                info!("{voter} declined the restart");
                self.restart = restart;
                self.version += 1;
            }
            VoteProgress::Pending => {
                self.restart = restart;
                self.version += 1;
            }
        }
        Ok(progress)
    }

    /// Shuffle, move the button, post blinds, deal hole cards and open the
    /// pre-flop round. Stacks and seating carry over from the last hand.
    pub fn start_hand(&mut self) -> Result<(), GameError> {
        if !matches!(self.stage, Stage::Lobby | Stage::HandComplete) {
            return Err(InvalidTransition::HandInProgress.into());
        }
        if self.funded_count() < 2 {
            return Err(InvalidTransition::NotEnoughPlayers.into());
        }

        self.hand_number += 1;
        self.stacks_at_hand_start = self.players.iter().map(|p| p.chips).collect();
        for player in &mut self.players {
            player.reset();
        }
        self.board.clear();
        self.ledger.clear();
        self.winners.clear();
        self.restart.clear();
        self.revealed = false;

        let seed = self.settings.deck_seed.map(|s| s.wrapping_add(self.hand_number));
        self.deck = Deck::shuffled(seed);

        let num_seats = self.players.len();
        let after = |seat: SeatIndex| (seat + 1) % num_seats;
        let dealer = match self.dealer_idx {
            Some(prev) => self.next_funded(after(prev)),
            None => self.next_funded(0),
        };
        let (small, big) = if self.funded_count() == 2 {
            (dealer, self.next_funded(after(dealer)))
        } else {
            let small = self.next_funded(after(dealer));
            (small, self.next_funded(after(small)))
        };
        self.dealer_idx = Some(dealer);

        self.post_blind(small, self.settings.small_blind);
        self.post_blind(big, self.settings.big_blind);

        for seat in 0..num_seats {
            if self.players[seat].is_folded() {
                continue;
            }
            match self.deck.draw(2) {
                Ok(cards) => self.players[seat].cards = cards,
                Err(e) => {
                    self.abort_hand(&e);
                    return Err(e);
                }
            }
        }

        self.round = Some(BettingRound::open(
            &self.players,
            after(big),
            self.settings.big_blind,
            self.settings.big_blind,
        ));
        self.stage = Stage::PreFlop;
        self.version += 1;
        info!(
            "hand {} dealt: button {}, blinds {}/{}",
            self.hand_number,
            self.players[dealer].id,
            self.players[small].id,
            self.players[big].id
        );
        Ok(())
    }

    /// First seat at or after `from` with chips, wrapping around.
    fn next_funded(&self, from: SeatIndex) -> SeatIndex {
        let n = self.players.len();
        (0..n)
            .map(|offset| (from + offset) % n)
            .find(|&seat| self.players[seat].chips > 0)
            .unwrap_or(from)
    }

    fn post_blind(&mut self, seat: SeatIndex, amount: Usd) {
        let player = &mut self.players[seat];
        let paid = player.commit(amount);
        if player.chips == 0 {
            player.state = PlayerState::AllIn;
        }
        self.ledger.contribute(seat, paid);
    }

    /// Apply one betting action from `id`.
    pub fn apply_action(
        &mut self,
        id: &PlayerId,
        action: Action,
    ) -> Result<RoundStatus, GameError> {
        let seat = self.seat_of(id).ok_or(GameError::UnknownPlayer)?;
        let Some(round) = self.round.as_mut() else {
            return Err(IllegalAction::NoActionPending.into());
        };
        let status = round.apply(seat, action, &mut self.players, &mut self.ledger)?;
        debug!("{} {action}", self.players[seat].name);

        if let RoundStatus::HandWon(winner) = status {
            self.award_uncontested(winner);
        }
        self.version += 1;
        Ok(status)
    }

    /// Deal the named stage. Rejects anything but the stage that follows
    /// the current one.
    pub fn deal(&mut self, requested: Stage) -> Result<Stage, GameError> {
        if !self.stage.is_betting() {
            return Err(InvalidTransition::NoHandInProgress.into());
        }
        if self.stage.next() != Some(requested) {
            return Err(InvalidTransition::WrongStage {
                current: self.stage,
                requested,
            }
            .into());
        }
        self.advance_stage()
    }

    /// Close a completed betting round: draw the next community cards and
    /// open the next round, or move to showdown after the river.
    pub fn advance_stage(&mut self) -> Result<Stage, GameError> {
        let Some(next) = self.stage.next() else {
            return Err(InvalidTransition::NoHandInProgress.into());
        };
        if !self.is_round_complete() {
            return Err(InvalidTransition::RoundInProgress.into());
        }

        if next == Stage::Showdown {
            self.round = None;
            self.stage = Stage::Showdown;
            self.revealed = true;
            self.version += 1;
            return Ok(next);
        }

        let n = match next {
            Stage::Flop => FLOP_CARDS,
            Stage::Turn => TURN_CARDS,
            _ => RIVER_CARDS,
        };
        let cards = match self.deck.draw(n) {
            Ok(cards) => cards,
            Err(e) => {
                self.abort_hand(&e);
                return Err(e);
            }
        };
        self.board.extend(cards);

        for player in &mut self.players {
            player.round_bet = 0;
            if player.can_act() {
                player.state = PlayerState::Wait;
            }
        }
        let first = self.dealer_idx.map_or(0, |d| (d + 1) % self.players.len());
        self.round = Some(BettingRound::open(
            &self.players,
            first,
            0,
            self.settings.big_blind,
        ));
        self.stage = next;
        self.version += 1;
        debug!("dealt the {next}: {:?}", self.board);
        Ok(next)
    }

    /// Evaluate every hand still in, pay out main and side pots, and record
    /// the winners. A completed river round is moved to showdown first.
    pub fn resolve_showdown(&mut self) -> Result<(), GameError> {
        if self.stage == Stage::River && self.is_round_complete() {
            self.advance_stage()?;
        }
        if self.stage != Stage::Showdown {
            return Err(InvalidTransition::NotAtShowdown.into());
        }

        let mut ranked: BTreeMap<SeatIndex, HandRank> = BTreeMap::new();
        for player in self.players.iter().filter(|p| !p.is_folded()) {
            let cards: Vec<Card> = player.cards.iter().chain(&self.board).copied().collect();
            ranked.insert(player.seat_idx, evaluate(&cards)?);
        }

        let pots = self.ledger.compute_pots(&self.players);
        let payouts = distribute(&pots, &ranked, &self.action_order());
        self.winners = payouts
            .iter()
            .filter(|(_, won)| **won > 0)
            .map(|(&seat, &amount)| WinnerView {
                player_id: self.players[seat].id.clone(),
                amount,
                hand: ranked.get(&seat).copied(),
            })
            .collect();
        for (seat, won) in payouts {
            self.players[seat].chips += won;
        }
        self.ledger.clear();
        self.finish_hand();
        for winner in &self.winners {
            info!("{} won ${} at showdown", winner.player_id, winner.amount);
        }
        Ok(())
    }

    fn award_uncontested(&mut self, seat: SeatIndex) {
        let amount = self.ledger.total();
        self.players[seat].chips += amount;
        self.winners = vec![WinnerView {
            player_id: self.players[seat].id.clone(),
            amount,
            hand: None,
        }];
        self.ledger.clear();
        self.finish_hand();
        info!("{} won ${amount} uncontested", self.players[seat].id);
    }

    fn finish_hand(&mut self) {
        self.round = None;
        self.restart.clear();
        self.stage = Stage::HandComplete;
    }

    /// Unwind the hand in progress after a fatal dealing error.
    fn abort_hand(&mut self, cause: &GameError) {
        error!(
            "aborting hand {}: {cause}; refunding stacks",
            self.hand_number
        );
        for (player, &chips) in self.players.iter_mut().zip(&self.stacks_at_hand_start) {
            player.chips = chips;
            player.reset();
        }
        self.board.clear();
        self.ledger.clear();
        self.round = None;
        self.revealed = false;
        self.stage = Stage::Lobby;
        self.version += 1;
    }

    /// Seats from the first to act after the button around to the button.
    #[must_use]
    pub fn action_order(&self) -> Vec<SeatIndex> {
        let n = self.players.len();
        let first = self.dealer_idx.map_or(0, |d| d + 1);
        (0..n).map(|offset| (first + offset) % n).collect()
    }

    /// Snapshot as everyone sees it.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot {
        self.build_snapshot(None)
    }

    /// Snapshot as `viewer` sees it: the public view plus their own cards.
    #[must_use]
    pub fn snapshot_for(&self, viewer: &PlayerId) -> TableSnapshot {
        self.build_snapshot(Some(viewer))
    }

    fn build_snapshot(&self, viewer: Option<&PlayerId>) -> TableSnapshot {
        let id_of = |seat: SeatIndex| self.players[seat].id.clone();
        let players = self
            .players
            .iter()
            .map(|p| {
                let visible =
                    (self.revealed && !p.is_folded()) || viewer.is_some_and(|v| v == &p.id);
                PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    chips: p.chips,
                    round_bet: p.round_bet,
                    state: p.state,
                    folded: p.is_folded(),
                    all_in: p.is_all_in(),
                    cards: if visible { p.cards.clone() } else { Vec::new() },
                }
            })
            .collect();
        let pots = self
            .ledger
            .compute_pots(&self.players)
            .into_iter()
            .map(|pot| PotView {
                amount: pot.amount,
                eligible: pot.eligible.into_iter().map(id_of).collect(),
            })
            .collect();

        TableSnapshot {
            hand_number: self.hand_number,
            stage: self.stage,
            board: self.board.clone(),
            players,
            dealer: self.dealer_idx.map(id_of),
            current_turn: self.current_turn().cloned(),
            highest_bet: self.round.as_ref().map_or(0, |r| r.highest_bet),
            pots,
            pot_total: self.ledger.total(),
            winners: self.winners.clone(),
            restart_vote: self.restart.view(),
        }
    }
}
