//! Table actor message types.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::{TableId, config::TableConfigError};
use crate::game::{
    GameError, StartOutcome,
    betting::RoundStatus,
    entities::{Action, PlayerId, SeatIndex, TableSnapshot, Usd},
    restart::VoteProgress,
    states::Stage,
};

/// Failures talking to a table, on top of the game's own rejections.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TableError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("table {0} is closed")]
    Closed(TableId),
    #[error("table {0} not found")]
    NotFound(TableId),
    #[error("invalid table config: {0}")]
    InvalidConfig(#[from] TableConfigError),
}

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// Take a seat in the lobby
    Join {
        player_id: PlayerId,
        name: String,
        response: oneshot::Sender<Result<SeatIndex, GameError>>,
    },

    /// Start the first hand, or propose the next one
    RequestStart {
        player_id: PlayerId,
        response: oneshot::Sender<Result<StartOutcome, GameError>>,
    },

    /// Vote on an open restart proposal
    RespondStart {
        player_id: PlayerId,
        accept: bool,
        response: oneshot::Sender<Result<VoteProgress, GameError>>,
    },

    /// Player action (fold, check, call, raise, all-in)
    TakeAction {
        player_id: PlayerId,
        action: Action,
        response: oneshot::Sender<Result<RoundStatus, GameError>>,
    },

    /// Deal the flop, turn or river
    Deal {
        stage: Stage,
        response: oneshot::Sender<Result<Stage, GameError>>,
    },

    /// Resolve the hand at showdown
    Showdown {
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Current state, optionally as seen by one player
    GetSnapshot {
        viewer: Option<PlayerId>,
        response: oneshot::Sender<TableSnapshot>,
    },

    /// Lightweight listing info
    GetSummary {
        response: oneshot::Sender<TableSummary>,
    },

    /// Subscribe to table events
    Subscribe {
        subscriber: PlayerId,
        sender: mpsc::Sender<TableEvent>,
    },

    /// Unsubscribe from table events
    Unsubscribe { subscriber: PlayerId },

    /// Shut the table down
    Close { response: oneshot::Sender<()> },
}

/// Pushed to subscribers after accepted mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum TableEvent {
    /// State as the receiving subscriber is allowed to see it
    GameUpdate(Box<TableSnapshot>),
    /// A restart vote opened
    StartGameRequest { requester: PlayerId },
    /// A restart ballot was counted
    RestartVoteRecorded { player_id: PlayerId, accept: bool },
}

/// Table info for discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: TableId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub small_blind: Usd,
    pub big_blind: Usd,
    pub stage: Stage,
    pub hand_number: u64,
}
