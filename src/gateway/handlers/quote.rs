//! Quote and estimate handlers

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResponse};
use crate::quote::{PreviewRequest, QuoteRequest, TransferEstimate, TransferPreview, TransferQuote};

/// Compute a full transfer quote for a corridor
///
/// The breakdown covers fee, converted amount, and total to pay, with a
/// 30-minute rate lock window.
#[utoipa::path(
    post,
    path = "/api/v1/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Quote computed", body = TransferQuote),
        (status = 400, description = "Invalid amount or unavailable corridor"),
        (status = 404, description = "Country, rate, or fee configuration missing"),
        (status = 422, description = "No fee band covers the amount")
    ),
    tag = "Quotes"
)]
pub async fn create_quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<ApiResponse<TransferQuote>>, ApiError> {
    let quote = state.quotes.quote(req).await?;
    Ok(Json(ApiResponse::success(quote)))
}

/// Preview a transfer before submitting it
///
/// Validates that the chosen payment and receiving methods belong to the
/// corridor's countries and echoes the recipient details with the quote.
#[utoipa::path(
    post,
    path = "/api/v1/quote/preview",
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Preview computed", body = TransferPreview),
        (status = 400, description = "Method from the wrong country or missing recipient details"),
        (status = 404, description = "Country, method, rate, or fee configuration missing"),
        (status = 422, description = "No fee band covers the amount")
    ),
    tag = "Quotes"
)]
pub async fn preview_quote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<ApiResponse<TransferPreview>>, ApiError> {
    let preview = state.quotes.preview(req).await?;
    Ok(Json(ApiResponse::success(preview)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EstimateQuery {
    /// Source currency code, e.g. "EUR"
    pub from: String,
    /// Destination currency code, e.g. "XOF"
    pub to: String,
    pub amount: Decimal,
}

/// Ballpark estimate by currency codes
///
/// Uses a flat fee percentage instead of the corridor fee schedule; the
/// binding quote can differ.
#[utoipa::path(
    get,
    path = "/api/v1/estimate",
    params(EstimateQuery),
    responses(
        (status = 200, description = "Estimate computed", body = TransferEstimate),
        (status = 404, description = "Currency or rate missing")
    ),
    tag = "Quotes"
)]
pub async fn get_estimate(
    State(state): State<Arc<AppState>>,
    Query(q): Query<EstimateQuery>,
) -> Result<Json<ApiResponse<TransferEstimate>>, ApiError> {
    let estimate = state.quotes.estimate(&q.from, &q.to, q.amount).await?;
    Ok(Json(ApiResponse::success(estimate)))
}
