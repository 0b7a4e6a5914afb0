//! HTTP/WebSocket API for the hold'em server.
//!
//! # Endpoints
//!
//! - `GET /health` - Server health status
//! - `GET /api/tables` - List running tables
//! - `GET /ws/{table_id}` - Play at a table over a WebSocket
//!
//! # CORS
//!
//! CORS is configured permissively. Put the server behind a proxy that
//! restricts origins before exposing it.

pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use holdem::table::{TableManager, TableSummary};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub table_manager: Arc<TableManager>,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tables", get(list_tables))
        .route("/ws/{table_id}", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","tables":1}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let table_count = state.table_manager.active_table_count().await;
    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": table_count,
    });
    (StatusCode::OK, Json(response))
}

/// List every running table.
async fn list_tables(State(state): State<AppState>) -> Json<Vec<TableSummary>> {
    Json(state.table_manager.list_tables().await)
}
