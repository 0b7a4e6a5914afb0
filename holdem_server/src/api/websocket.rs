//! WebSocket handler for playing at a table.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{table_id}`
//! 2. The connection gets a fresh id, which becomes its player id if it
//!    joins, and subscribes to the table
//! 3. A send task forwards table events (per-viewer snapshots, restart vote
//!    notices) and error replies to the socket
//! 4. Incoming text frames are parsed as client events and dispatched to the
//!    table actor; rejections come back only to this connection
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws/1');
//! ws.send(JSON.stringify({ event: "joinGame", payload: { name: "alice" } }));
//! ws.send(JSON.stringify({ event: "bet", payload: { action: "raise", amount: 40 } }));
//! ```

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use holdem::{
    ClientEvent, ServerEvent,
    entities::PlayerId,
    table::{TableEvent, TableHandle, TableId},
};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::AppState;

/// Upgrade to a WebSocket bound to `table_id`. Unknown tables get `404`.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(table_id): Path<TableId>,
    State(state): State<AppState>,
) -> Response {
    let Some(table) = state.table_manager.get_table(table_id).await else {
        return (StatusCode::NOT_FOUND, "Table not found").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, table))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, table: TableHandle) {
    let connection_id = PlayerId::from(Uuid::new_v4().to_string());
    let table_id = table.table_id();
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: table={table_id}, connection={connection_id}");

    let (event_tx, mut event_rx) = mpsc::channel::<TableEvent>(32);
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerEvent>(32);

    if let Err(e) = table.subscribe(connection_id.clone(), event_tx).await {
        error!("Failed to subscribe to table {table_id}: {e}");
        return;
    }

    let send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(event) = event_rx.recv() => ServerEvent::from(event),
                Some(reply) = reply_rx.recv() => reply,
                else => break,
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server event: {e}");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Some(reply) = handle_text(&table, &connection_id, text.as_str()).await
                    && reply_tx.send(reply).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("WebSocket error on {connection_id}: {e}");
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    let _ = table.unsubscribe(connection_id.clone()).await;

    info!("WebSocket disconnected: table={table_id}, connection={connection_id}");
}

/// Parse and dispatch one text frame. Returns the error reply for the
/// sender, or `None` if the table accepted the event.
pub async fn handle_text(
    table: &TableHandle,
    player_id: &PlayerId,
    text: &str,
) -> Option<ServerEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Failed to parse client message from {player_id}: {e}");
            return Some(ServerEvent::error(format!("Invalid message: {e}")));
        }
    };

    debug!("{player_id} {event}");
    match table.dispatch(player_id, event).await {
        Ok(()) => None,
        Err(e) => Some(ServerEvent::error(e)),
    }
}
