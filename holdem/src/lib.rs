//! # Holdem
//!
//! An authoritative multiplayer Texas Hold'em engine.
//!
//! Each table is a [`TableSession`] that validates every action against the
//! betting rules before touching any state, tracks contributions in a pot
//! ledger that splits into side pots when players go all-in, and resolves
//! hands at showdown. Finished hands are restarted by unanimous vote.
//!
//! A table is lifecycle-driven through these stages:
//!
//! - **Lobby**: players join
//! - **PreFlop/Flop/Turn/River**: betting rounds, each dealt on request once
//!   the previous round is complete
//! - **Showdown**: hands are evaluated and pots distributed
//! - **HandComplete**: waiting on a restart vote
//!
//! ## Core Modules
//!
//! - [`game`]: entities, evaluator, pot ledger, betting rounds, session
//! - [`table`]: one async actor per table, plus a manager for many tables
//! - [`net`]: JSON client/server events
//!
//! ## Example
//!
//! ```
//! use holdem::{Action, TableSession};
//!
//! let mut table = TableSession::new();
//! table.join("a".into(), "alice").unwrap();
//! table.join("b".into(), "bob").unwrap();
//! table.start_hand().unwrap();
//!
//! let first = table.current_turn().cloned().unwrap();
//! table.apply_action(&first, Action::Fold).unwrap();
//! assert_eq!(table.winners().len(), 1);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameError, GameSettings, IllegalAction, InvalidTransition, StartOutcome, TableSession,
    constants::{self, MAX_PLAYERS},
    entities::{self, Action, Card, PlayerId, TableSnapshot},
    functional::{self, HandRank, Rank},
    states::Stage,
};

/// Networking message types.
pub mod net;
pub use net::messages::{ClientEvent, ServerEvent};

/// Multi-table support with the async actor model.
pub mod table;
pub use table::{TableActor, TableConfig, TableConfigError, TableHandle, TableManager};
