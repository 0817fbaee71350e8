//! WebSocket handler for client connections
//!
//! Handles WebSocket upgrade, token authentication, connection lifecycle,
//! and message forwarding. Two endpoints: a user channel scoped to the
//! authenticated sender, and an admin broadcast channel gated on role.

use axum::extract::ws::{Message, WebSocket};
use axum::http::StatusCode;
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::connection::ConnectionManager;
use super::messages::WsEvent;
use crate::gateway::state::AppState;

/// WebSocket connection query parameters
///
/// Browsers cannot set headers on a WebSocket upgrade, so the JWT rides
/// in the query string.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// User channel upgrade handler
///
/// Endpoint: GET /ws/transactions?token=<jwt>
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let claims = match state.auth.verify(&params.token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(%err, "WebSocket upgrade rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let manager = state.ws_manager.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, claims.sub, manager))
}

/// Admin channel upgrade handler
///
/// Endpoint: GET /ws/admin/transactions?token=<jwt>
/// Requires an admin or agent role claim.
pub async fn admin_ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let claims = match state.auth.verify(&params.token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(%err, "Admin WebSocket upgrade rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };
    if !claims.role.is_operator() {
        tracing::warn!(user_id = %claims.sub, "Non-operator attempted admin channel");
        return StatusCode::FORBIDDEN.into_response();
    }

    let manager = state.ws_manager.clone();
    ws.on_upgrade(move |socket| handle_admin_socket(socket, claims.sub, manager))
}

/// Clients probe liveness with the literal text frame `ping` and expect
/// the literal `pong` back.
fn is_ping(text: &str) -> bool {
    text.trim() == "ping"
}

fn encode_frame(event: &WsEvent) -> Option<Message> {
    match event {
        WsEvent::Pong => Some(Message::Text("pong".into())),
        other => serde_json::to_string(other)
            .ok()
            .map(|json| Message::Text(json.into())),
    }
}

/// Handle user WebSocket connection lifecycle
async fn handle_socket(socket: WebSocket, user_id: Uuid, manager: Arc<ConnectionManager>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsEvent>();

    let conn_id = manager.add_connection(user_id, tx.clone());

    // Send welcome message
    let welcome = WsEvent::connected(user_id);
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    // Forward events from the channel to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(frame) = encode_frame(&event) {
                if sender.send(frame).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages (ping/pong, close)
    let tx_for_recv = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if is_ping(&text) {
                        let _ = tx_for_recv.send(WsEvent::pong());
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    manager.remove_connection(user_id, conn_id);
}

/// Handle admin WebSocket connection lifecycle
async fn handle_admin_socket(socket: WebSocket, admin_id: Uuid, manager: Arc<ConnectionManager>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsEvent>();

    let conn_id = manager.add_admin_connection(tx.clone());

    let welcome = WsEvent::connected(admin_id);
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(frame) = encode_frame(&event) {
                if sender.send(frame).await.is_err() {
                    break;
                }
            }
        }
    });

    let tx_for_recv = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if is_ping(&text) {
                        let _ = tx_for_recv.send(WsEvent::pong());
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    manager.remove_admin_connection(conn_id);
}
