//! Sender-facing transaction handlers
//!
//! All routes here sit behind the JWT middleware; `Claims` arrives via
//! request extensions. Amounts are never taken from the client: creation
//! re-quotes server-side and captures the result on the record.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResponse};
use crate::auth::Claims;
use crate::error::Error;
use crate::quote::QuoteRequest;
use crate::transaction::model::{NewTransaction, Transaction, TransactionStatusHistory};
use crate::transaction::{PaymentInstructions, StatusReport};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub from_country_id: Uuid,
    pub to_country_id: Uuid,
    pub amount: Decimal,
    /// When true, `amount` is the all-in total
    #[serde(default)]
    pub include_fee: bool,
    pub payment_method_id: Uuid,
    pub receiving_method_id: Uuid,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

fn page(q: &PageQuery) -> (i64, i64) {
    let offset = q.offset.unwrap_or(0).max(0);
    let limit = q.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (offset, limit)
}

/// Create a transaction
///
/// Re-quotes the corridor server-side, captures rate and fee on the
/// record, and opens the 15-minute payment window.
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created", body = Transaction),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Country, rate, fee, or method missing")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    if req.recipient_name.trim().is_empty() {
        return Err(Error::validation("recipient name is required").into());
    }
    if req.recipient_phone.trim().is_empty() {
        return Err(Error::validation("recipient phone is required").into());
    }

    let quote = state
        .quotes
        .quote(QuoteRequest {
            from_country_id: req.from_country_id,
            to_country_id: req.to_country_id,
            amount: req.amount,
            include_fee: req.include_fee,
        })
        .await?;

    let txn = state
        .transactions
        .create(
            claims.sub,
            NewTransaction {
                sender_country_id: req.from_country_id,
                receiver_country_id: req.to_country_id,
                sender_currency: quote.from_currency,
                receiver_currency: quote.to_currency,
                sender_amount: quote.amounts.sender_amount,
                receiver_amount: quote.amounts.receiver_amount,
                exchange_rate: quote.exchange_rate,
                applied_fee: quote.amounts.fee,
                total_to_pay: quote.amounts.total_to_pay,
                payment_method_id: req.payment_method_id,
                receiving_method_id: req.receiving_method_id,
                recipient_name: req.recipient_name,
                recipient_phone: req.recipient_phone,
                notes: req.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(txn))))
}

/// List the caller's transactions, newest first
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(PageQuery),
    responses((status = 200, description = "Transactions", body = [Transaction])),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn list_my_transactions(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let (offset, limit) = page(&q);
    let txns = state
        .transactions
        .list_by_sender(claims.sub, offset, limit)
        .await?;
    Ok(Json(ApiResponse::success(txns)))
}

/// Fetch one transaction
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction", body = Transaction),
        (status = 404, description = "Not found or not owned")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let txn = state
        .transactions
        .get_owned(id, claims.sub, claims.role.is_operator())
        .await?;
    Ok(Json(ApiResponse::success(txn)))
}

/// Fetch one transaction by its human-readable reference
#[utoipa::path(
    get,
    path = "/api/v1/transactions/by-reference/{reference}",
    params(("reference" = String, Path, description = "Reference, e.g. RTX1f3a9c02bd")),
    responses(
        (status = 200, description = "Transaction", body = Transaction),
        (status = 404, description = "Not found or not owned")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction_by_reference(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let txn = state
        .transactions
        .get_by_reference(&reference, claims.sub, claims.role.is_operator())
        .await?;
    Ok(Json(ApiResponse::success(txn)))
}

/// Poll status with confirmation-window countdown
///
/// Reading past the window force-cancels a transaction still awaiting
/// deposit, so the report always reflects the final state.
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}/status",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Status report", body = StatusReport),
        (status = 404, description = "Not found or not owned")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction_status(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<StatusReport>>, ApiError> {
    let report = state
        .transactions
        .status_report(id, claims.sub, claims.role.is_operator())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Deposit instructions for a transaction awaiting payment
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}/payment-details",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Payment instructions", body = PaymentInstructions),
        (status = 404, description = "Not found or not owned"),
        (status = 400, description = "Payment window elapsed or not awaiting deposit")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn get_payment_details(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentInstructions>>, ApiError> {
    let details = state.transactions.payment_details(id, claims.sub).await?;
    Ok(Json(ApiResponse::success(details)))
}

/// Confirm the deposit was made
///
/// Moves the transaction out of the entry state. Past the 15-minute
/// window this fails with 400 and the transaction is cancelled.
#[utoipa::path(
    patch,
    path = "/api/v1/transactions/{id}/confirm-payment",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Confirmed", body = Transaction),
        (status = 404, description = "Not found or not owned"),
        (status = 400, description = "Payment window elapsed or not awaiting deposit")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let txn = state.transactions.confirm_payment(id, claims.sub).await?;
    Ok(Json(ApiResponse::success(txn)))
}

/// Cancel an in-flight transaction
#[utoipa::path(
    patch,
    path = "/api/v1/transactions/{id}/cancel",
    params(("id" = Uuid, Path, description = "Transaction id")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Cancelled", body = Transaction),
        (status = 404, description = "Not found or not owned"),
        (status = 400, description = "Already terminal")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn cancel_transaction(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let txn = state
        .transactions
        .cancel(id, claims.sub, req.reason)
        .await?;
    Ok(Json(ApiResponse::success(txn)))
}

/// Audit trail of status changes, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}/history",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "History entries", body = [TransactionStatusHistory]),
        (status = 404, description = "Not found or not owned")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction_history(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<TransactionStatusHistory>>>, ApiError> {
    let history = state
        .transactions
        .history(id, claims.sub, claims.role.is_operator())
        .await?;
    Ok(Json(ApiResponse::success(history)))
}
