//! Table module providing multi-table support with an async actor model.
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task that owns its `TableSession`
//! and drains an mpsc inbox in arrival order. Callers hold a cloneable
//! `TableHandle` and get replies on oneshot channels. The `TableManager`
//! spawns actors and keeps their handles for discovery and shutdown.
//!
//! ## Example
//!
//! ```no_run
//! use holdem::table::{TableActor, TableConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, handle) = TableActor::new(1, TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     handle.join("conn-1".into(), "alice".to_string()).await.unwrap();
//! }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

/// Identifies a table within a [`TableManager`].
pub type TableId = u64;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableConfigError};
pub use manager::TableManager;
pub use messages::{TableError, TableEvent, TableMessage, TableSummary};
