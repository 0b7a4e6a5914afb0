//! Multi-table hold'em server using the async actor model.
//!
//! Each table runs in its own `TableActor` task owned by a `TableManager`;
//! clients talk to a table over `/ws/{table_id}`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Error};
use holdem::table::TableManager;
use holdem_server::{
    api,
    config::{DEFAULT_BIND, ServerConfig},
    logging,
};
use log::{error, info};
use pico_args::Arguments;

const HELP: &str = "\
Run a multi-table hold'em server

USAGE:
  holdem_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or DEFAULT_BIND]
  --tables     N           Number of tables to create  [default: env MAX_TABLES or 1]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  MAX_TABLES               Tables created at startup
  TABLE_NAME               Name prefix for startup tables
  TABLE_MAX_PLAYERS        Seats per table
  TABLE_STARTING_STACK     Chips each player starts with
  TABLE_SMALL_BLIND        Small blind
  TABLE_BIG_BLIND          Big blind
  TABLE_ACTION_TIMEOUT_MS  Fold idle players after this long
  TABLE_DECK_SEED          Fixed shuffle seed (testing only)
  RUST_LOG                 Log filter [default: info]
  (A .env file in the working directory is loaded first)
";

struct Args {
    bind: Option<SocketAddr>,
    num_tables: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP.replace("DEFAULT_BIND", DEFAULT_BIND));
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        num_tables: pargs.opt_value_from_str("--tables")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.num_tables)?;
    config.validate()?;
    info!("Starting hold'em server at {}", config.bind);

    let table_manager = Arc::new(TableManager::new());
    for n in 1..=config.num_tables {
        match table_manager.create_table(config.table_config(n)).await {
            Ok(table_id) => info!("Created table {n} with ID {table_id}"),
            Err(e) => error!("Failed to create table {n}: {e}"),
        }
    }

    for table in table_manager.list_tables().await {
        info!(
            "  - {} (ID: {}) - {}/{} players, blinds: {}/{}",
            table.name,
            table.id,
            table.player_count,
            table.max_players,
            table.small_blind,
            table.big_blind
        );
    }

    let app = api::create_router(api::AppState { table_manager });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
