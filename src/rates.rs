//! Exchange rate lookup
//!
//! Rates are directional: rate(A->B) is stored independently of rate(B->A)
//! and an unconfigured direction is NEVER recovered by inverting the reverse
//! rate. At most one active rate exists per ordered currency pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Error;

/// An active exchange rate row: destination units per 1 source unit.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRate {
    pub id: Uuid,
    pub from_currency_id: Uuid,
    pub to_currency_id: Uuid,
    /// Positive decimal, destination-per-one-source
    pub rate: Decimal,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Read-only access to exchange rates.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// The single active rate for the exact ordered pair, or None.
    async fn get_rate(
        &self,
        from_currency_id: Uuid,
        to_currency_id: Uuid,
    ) -> Result<Option<ExchangeRate>, Error>;
}

/// Resolve the active rate for an ordered pair, failing with NotFound when the
/// direction is unconfigured. Pure read, no inversion fallback.
pub async fn lookup_rate(
    store: &dyn RateStore,
    from_currency_id: Uuid,
    to_currency_id: Uuid,
    from_code: &str,
    to_code: &str,
) -> Result<ExchangeRate, Error> {
    store
        .get_rate(from_currency_id, to_currency_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("exchange rate for {}-{}", from_code, to_code)))
}
