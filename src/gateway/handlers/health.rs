//! Health check handler

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::State, Json};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiResponse;

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
    /// Users with at least one live WebSocket connection
    pub ws_users: usize,
    /// Live admin WebSocket connections
    pub ws_admins: usize,
}

/// Health check endpoint
///
/// Returns service health with the server timestamp and live WebSocket
/// counts. No internal dependency details are exposed.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<HealthResponse>> {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let (ws_users, _, ws_admins) = state.ws_manager.stats();

    Json(ApiResponse::success(HealthResponse {
        timestamp_ms,
        ws_users,
        ws_admins,
    }))
}
