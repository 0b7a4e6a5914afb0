//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.
//! Command-line values take precedence over the environment.

use holdem::{TableConfig, TableConfigError};
use std::net::SocketAddr;

/// Bind address used when neither `--bind` nor `SERVER_BIND` is given.
pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Startup tables are named "<prefix> <n>".
const DEFAULT_TABLE_NAME: &str = "Table";

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Settings every startup table is created with. The name is used as
    /// a prefix.
    pub table_defaults: TableConfig,
    /// Number of tables to create on startup
    pub num_tables: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        num_tables_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_strict("SERVER_BIND")?.unwrap_or(default_bind()),
        };

        let defaults = TableConfig::default();
        let table_defaults = TableConfig {
            name: std::env::var("TABLE_NAME").unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string()),
            max_players: parse_env_or("TABLE_MAX_PLAYERS", defaults.max_players),
            starting_stack: parse_env_or("TABLE_STARTING_STACK", defaults.starting_stack),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind),
            action_timeout_ms: parse_env_strict("TABLE_ACTION_TIMEOUT_MS")?,
            deck_seed: parse_env_strict("TABLE_DECK_SEED")?,
        };

        let num_tables = num_tables_override.unwrap_or_else(|| parse_env_or("MAX_TABLES", 1));

        Ok(ServerConfig {
            bind,
            table_defaults,
            num_tables,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tables == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_TABLES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        self.table_defaults
            .validate()
            .map_err(|err| ConfigError::Invalid {
                var: table_env_var(&err).to_string(),
                reason: err.to_string(),
            })
    }

    /// Config for the `n`th startup table (1-based).
    pub fn table_config(&self, n: usize) -> TableConfig {
        TableConfig {
            name: format!("{} {n}", self.table_defaults.name.trim()),
            ..self.table_defaults.clone()
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Environment variable behind the table setting `err` is about.
fn table_env_var(err: &TableConfigError) -> &'static str {
    match err {
        TableConfigError::EmptyName => "TABLE_NAME",
        TableConfigError::ZeroSmallBlind => "TABLE_SMALL_BLIND",
        TableConfigError::BigBlindBelowSmall { .. } => "TABLE_BIG_BLIND",
        TableConfigError::SeatCount(_) => "TABLE_MAX_PLAYERS",
        TableConfigError::ShortStack { .. } | TableConfigError::ChipOverflow { .. } => {
            "TABLE_STARTING_STACK"
        }
        TableConfigError::ZeroTimeout => "TABLE_ACTION_TIMEOUT_MS",
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an optional variable, failing if it's set to something unparseable.
fn parse_env_strict<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::Invalid {
                    var: key.to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
