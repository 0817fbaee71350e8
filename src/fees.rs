//! Fee rules and band resolution
//!
//! A fee rule applies to one country corridor within an inclusive
//! `[min_amount, max_amount]` band (`max_amount = None` means unbounded
//! above). Among the active rules of a corridor the first band containing the
//! amount wins; non-overlap of bands is data-entry discipline, not enforced
//! here.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;
use crate::money::{percentage_of, round_money, HUNDRED};

/// Fee type. A closed set; each variant has exactly one arithmetic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeType {
    /// `fee_value` is a flat amount in the source currency
    Fixed,
    /// `fee_value` is a percentage of the transfer amount
    Percentage,
    /// `fee_value` is the final fee amount for the matched tier
    Tiered,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Fixed => "FIXED",
            FeeType::Percentage => "PERCENTAGE",
            FeeType::Tiered => "TIERED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FIXED" => Some(FeeType::Fixed),
            "PERCENTAGE" => Some(FeeType::Percentage),
            "TIERED" => Some(FeeType::Tiered),
            _ => None,
        }
    }
}

/// A configured fee rule for a country corridor and amount band.
#[derive(Debug, Clone, Serialize)]
pub struct FeeRule {
    pub id: Uuid,
    pub from_country_id: Uuid,
    pub to_country_id: Uuid,
    pub fee_type: FeeType,
    pub fee_value: Decimal,
    /// Inclusive lower bound
    pub min_amount: Decimal,
    /// Inclusive upper bound; None = unbounded above
    pub max_amount: Option<Decimal>,
    pub is_active: bool,
}

impl FeeRule {
    /// Whether this rule's band contains `amount` (inclusive both ends).
    pub fn covers(&self, amount: Decimal) -> bool {
        amount >= self.min_amount && self.max_amount.map_or(true, |max| amount <= max)
    }

    /// The fee amount for `amount`, per fee type, rounded at money scale.
    pub fn fee_amount(&self, amount: Decimal) -> Decimal {
        match self.fee_type {
            FeeType::Fixed => round_money(self.fee_value),
            FeeType::Percentage => percentage_of(amount, self.fee_value),
            FeeType::Tiered => round_money(self.fee_value),
        }
    }

    /// Equivalent percentage for display. Exact for Percentage rules,
    /// derived for Fixed/Tiered when the amount is positive.
    pub fn fee_percent_equivalent(&self, amount: Decimal) -> Option<Decimal> {
        match self.fee_type {
            FeeType::Percentage => Some(self.fee_value),
            FeeType::Fixed | FeeType::Tiered => {
                if amount > Decimal::ZERO {
                    Some(round_money(self.fee_amount(amount) / amount * HUNDRED))
                } else {
                    None
                }
            }
        }
    }
}

/// Read-only access to fee rules.
#[async_trait]
pub trait FeeStore: Send + Sync {
    /// Active rules for the exact (source country, destination country)
    /// corridor, ordered by `min_amount` ascending.
    async fn corridor_rules(
        &self,
        from_country_id: Uuid,
        to_country_id: Uuid,
    ) -> Result<Vec<FeeRule>, Error>;
}

/// Select the applicable rule for `amount` among a corridor's active rules.
///
/// Errors:
/// - NotFound when the corridor has no active rules at all
/// - NoBandMatch when rules exist but no band covers the amount
pub fn resolve_fee(rules: &[FeeRule], amount: Decimal) -> Result<&FeeRule, Error> {
    if rules.is_empty() {
        return Err(Error::not_found("fee configuration for corridor"));
    }
    rules
        .iter()
        .find(|r| r.is_active && r.covers(amount))
        .ok_or(Error::NoBandMatch { amount })
}
