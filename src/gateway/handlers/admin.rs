//! Operator handlers
//!
//! Routes layered behind both the JWT middleware and the operator gate.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResponse};
use crate::auth::Claims;
use crate::transaction::model::Transaction;
use crate::transaction::TransactionStatus;

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminListQuery {
    /// Filter by status, e.g. FUNDS_DEPOSITED
    pub status: Option<TransactionStatus>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: TransactionStatus,
    pub reason: Option<String>,
}

/// Compact acknowledgement of an operator transition.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateStatusResponse {
    pub transaction_id: Uuid,
    pub reference: String,
    pub old_status: TransactionStatus,
    pub new_status: TransactionStatus,
    pub updated_at: DateTime<Utc>,
}

/// List transactions across all senders
#[utoipa::path(
    get,
    path = "/api/v1/admin/transactions",
    params(AdminListQuery),
    responses((status = 200, description = "Transactions", body = [Transaction])),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_list_transactions(
    State(state): State<Arc<AppState>>,
    Query(q): Query<AdminListQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let offset = q.offset.unwrap_or(0).max(0);
    let limit = q.limit.unwrap_or(50).clamp(1, 200);
    let txns = state.transactions.list(q.status, offset, limit).await?;
    Ok(Json(ApiResponse::success(txns)))
}

/// Drive a transaction through the state machine
///
/// Validates the requested transition, records the audit entry, and
/// notifies the sender and all admin channels. A concurrent update on the
/// same transaction surfaces as 409.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/transactions/{id}/status",
    params(("id" = Uuid, Path, description = "Transaction id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = UpdateStatusResponse),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Concurrent update lost the race"),
        (status = 400, description = "Transition not allowed from the current state")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn admin_update_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<UpdateStatusResponse>>, ApiError> {
    let before = state.transactions.get_owned(id, claims.sub, true).await?;
    let txn = state
        .transactions
        .update_status(id, req.status, claims.sub, req.reason)
        .await?;
    Ok(Json(ApiResponse::success(UpdateStatusResponse {
        transaction_id: txn.id,
        reference: txn.reference,
        old_status: before.status,
        new_status: txn.status,
        updated_at: txn.updated_at,
    })))
}
