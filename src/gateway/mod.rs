//! HTTP gateway
//!
//! Routes, middleware layering, and server startup. Three route groups:
//! public (health, quote, estimate), sender (JWT), and admin (JWT plus
//! operator gate). WebSocket upgrades authenticate via a token query
//! parameter instead of the middleware.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{jwt_auth_middleware, require_operator};
use crate::websocket::handler::{admin_ws_handler, ws_handler};
use openapi::ApiDoc;
use state::AppState;

/// Build the full application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/quote", post(handlers::create_quote))
        .route("/api/v1/quote/preview", post(handlers::preview_quote))
        .route("/api/v1/estimate", get(handlers::get_estimate));

    let sender_routes = Router::new()
        .route(
            "/api/v1/transactions",
            post(handlers::create_transaction).get(handlers::list_my_transactions),
        )
        .route("/api/v1/transactions/{id}", get(handlers::get_transaction))
        .route(
            "/api/v1/transactions/by-reference/{reference}",
            get(handlers::get_transaction_by_reference),
        )
        .route(
            "/api/v1/transactions/{id}/status",
            get(handlers::get_transaction_status),
        )
        .route(
            "/api/v1/transactions/{id}/payment-details",
            get(handlers::get_payment_details),
        )
        .route(
            "/api/v1/transactions/{id}/confirm-payment",
            patch(handlers::confirm_payment),
        )
        .route(
            "/api/v1/transactions/{id}/cancel",
            patch(handlers::cancel_transaction),
        )
        .route(
            "/api/v1/transactions/{id}/history",
            get(handlers::get_transaction_history),
        )
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/transactions",
            get(handlers::admin_list_transactions),
        )
        .route(
            "/api/v1/admin/transactions/{id}/status",
            patch(handlers::admin_update_status),
        )
        .layer(axum::middleware::from_fn(require_operator))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let ws_routes = Router::new()
        .route("/ws/transactions", get(ws_handler))
        .route("/ws/admin/transactions", get(admin_ws_handler));

    Router::new()
        .merge(public_routes)
        .merge(sender_routes)
        .merge(admin_routes)
        .merge(ws_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

/// Start the HTTP gateway server
pub async fn run_server(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Gateway listening");
    tracing::info!("Swagger UI at http://localhost:{port}/docs");

    axum::serve(listener, app).await?;
    Ok(())
}
