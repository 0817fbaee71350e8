//! Reference data: countries, currencies, payment/receiving methods
//!
//! These entities are managed elsewhere (plain CRUD); the core only reads
//! them through [`ReferenceStore`]. A corridor is not a stored entity; it is
//! derived per-request from an ordered (source country, destination country)
//! pair.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

/// Currency reference record
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Currency {
    pub id: Uuid,
    /// ISO 4217 code, e.g. "EUR"
    pub code: String,
    pub symbol: String,
    pub is_active: bool,
}

/// Country reference record with its currency flattened in.
///
/// `can_send` / `can_receive` gate corridor availability at quote time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub currency_id: Uuid,
    pub currency_code: String,
    pub currency_symbol: String,
    pub can_send: bool,
    pub can_receive: bool,
}

/// A payment method offered in a source country (how the sender pays us)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub country_id: Uuid,
    /// e.g. "Mobile Money", "Bank Transfer", "Card"
    pub kind: String,
    pub owner_name: String,
    pub phone_number: Option<String>,
    pub account_number: Option<String>,
}

/// A receiving method offered in a destination country (how the recipient is paid)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceivingMethod {
    pub id: Uuid,
    pub country_id: Uuid,
    pub kind: String,
}

/// Read-only access to reference data.
///
/// CRUD for these tables lives outside this core; implementations are thin
/// lookups (`store::postgres`, `store::memory`).
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn country(&self, id: Uuid) -> Result<Option<Country>, Error>;

    async fn currency_by_code(&self, code: &str) -> Result<Option<Currency>, Error>;

    async fn payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, Error>;

    async fn receiving_method(&self, id: Uuid) -> Result<Option<ReceivingMethod>, Error>;
}
