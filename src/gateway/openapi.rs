//! OpenAPI / Swagger UI documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::fees::FeeType;
use crate::gateway::handlers::admin::{UpdateStatusRequest, UpdateStatusResponse};
use crate::gateway::handlers::transaction::{CancelRequest, CreateTransactionRequest};
use crate::gateway::handlers::HealthResponse;
use crate::quote::{
    PreviewRequest, QuoteBreakdown, QuoteRequest, TransferAmounts, TransferEstimate,
    TransferPreview, TransferQuote,
};
use crate::transaction::model::{Transaction, TransactionStatusHistory};
use crate::transaction::status::TransactionStatus;
use crate::transaction::{PaymentInstructions, StatusReport};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Main API documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RemitFlow API",
        version = "1.0.0",
        description = "Cross-border money transfer backend: corridor quoting, transaction lifecycle, and real-time status notifications."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_quote,
        crate::gateway::handlers::preview_quote,
        crate::gateway::handlers::get_estimate,
        crate::gateway::handlers::create_transaction,
        crate::gateway::handlers::list_my_transactions,
        crate::gateway::handlers::get_transaction,
        crate::gateway::handlers::get_transaction_by_reference,
        crate::gateway::handlers::get_transaction_status,
        crate::gateway::handlers::get_payment_details,
        crate::gateway::handlers::confirm_payment,
        crate::gateway::handlers::cancel_transaction,
        crate::gateway::handlers::get_transaction_history,
        crate::gateway::handlers::admin_list_transactions,
        crate::gateway::handlers::admin_update_status,
    ),
    components(
        schemas(
            HealthResponse,
            QuoteRequest,
            PreviewRequest,
            TransferAmounts,
            QuoteBreakdown,
            TransferQuote,
            TransferPreview,
            TransferEstimate,
            FeeType,
            Transaction,
            TransactionStatus,
            TransactionStatusHistory,
            StatusReport,
            PaymentInstructions,
            CreateTransactionRequest,
            CancelRequest,
            UpdateStatusRequest,
            UpdateStatusResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "System", description = "Health and diagnostics"),
        (name = "Quotes", description = "Transfer quoting and estimates"),
        (name = "Transactions", description = "Sender transaction lifecycle"),
        (name = "Admin", description = "Operator transaction management")
    )
)]
pub struct ApiDoc;
