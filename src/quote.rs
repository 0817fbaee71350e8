//! Transfer quoting
//!
//! Combines corridor checks, the directional exchange rate, and the fee
//! schedule into a full breakdown of what the sender pays and the recipient
//! receives. Every intermediate figure is rounded half-up at money scale
//! before it feeds the next step, so the breakdown always adds up in the
//! currency's smallest unit.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::corridor::{Country, ReferenceStore};
use crate::error::Error;
use crate::fees::{resolve_fee, FeeStore, FeeType};
use crate::money::{format_amount, format_rate, percentage_of, round_money};
use crate::rates::{lookup_rate, RateStore};

/// How long a quoted rate is honored at transaction creation.
pub const RATE_LOCK_SECS: i64 = 1800;

/// Flat percentage used only by the anonymous estimate endpoint, where no
/// corridor fee schedule is consulted.
const ESTIMATE_FEE_PERCENT: &str = "2.5";

/// Delivery promise shown with every quote.
const ESTIMATED_DELIVERY: &str = "Within 24 hours";

/// Quote request as received from the client.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub from_country_id: Uuid,
    pub to_country_id: Uuid,
    pub amount: Decimal,
    /// When true, `amount` is the all-in total and the fee comes out of it.
    #[serde(default)]
    pub include_fee: bool,
}

/// Pure money breakdown of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransferAmounts {
    /// The amount the sender entered, in source currency
    pub sender_amount: Decimal,
    /// What is converted and sent to the recipient, in source currency
    pub principal: Decimal,
    /// Fee charged, in source currency
    pub fee: Decimal,
    /// What the recipient receives, in destination currency
    pub receiver_amount: Decimal,
    /// What the sender pays in total, in source currency
    pub total_to_pay: Decimal,
}

/// Full quote returned to the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferQuote {
    pub from_country_id: Uuid,
    pub to_country_id: Uuid,
    pub from_currency: String,
    pub to_currency: String,
    pub include_fee: bool,
    pub amounts: TransferAmounts,
    pub exchange_rate: Decimal,
    /// Fee as a percentage of the entered amount, when derivable
    pub fee_percent: Option<Decimal>,
    pub fee_type: FeeType,
    pub breakdown: QuoteBreakdown,
    /// Delivery promise for the corridor
    pub estimated_delivery: String,
    /// The quoted rate is honored until this instant
    pub rate_expires_at: DateTime<Utc>,
}

/// Display lines of a quote, one per figure the client renders,
/// e.g. `"103.50 EUR"` and `"1 EUR = 655.0000 XOF"`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuoteBreakdown {
    pub you_send: String,
    pub fee: String,
    pub total_to_pay: String,
    pub exchange_rate: String,
    pub they_receive: String,
}

/// Preview request: a quote plus the chosen methods and recipient.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PreviewRequest {
    pub from_country_id: Uuid,
    pub to_country_id: Uuid,
    pub amount: Decimal,
    #[serde(default)]
    pub include_fee: bool,
    pub payment_method_id: Uuid,
    pub receiving_method_id: Uuid,
    pub recipient_name: String,
    pub recipient_phone: String,
}

/// Quote enriched with the validated method pair and recipient echo,
/// ready to be submitted as a transaction.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferPreview {
    pub quote: TransferQuote,
    pub payment_method_id: Uuid,
    pub payment_kind: String,
    pub receiving_method_id: Uuid,
    pub receiving_kind: String,
    pub recipient_name: String,
    pub recipient_phone: String,
}

/// Corridor-free estimate for the public landing page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferEstimate {
    pub from_currency: String,
    pub to_currency: String,
    pub amounts: TransferAmounts,
    pub exchange_rate: Decimal,
    pub fee_percent: Decimal,
    pub rate_display: String,
}

/// Compute the money breakdown for a transfer.
///
/// `fee` has already been resolved from the schedule and rounded. In
/// fee-on-top mode the entered amount converts in full; in fee-included
/// mode the fee comes out of the entered amount first and only the
/// remainder converts.
pub fn calculate_transfer_amounts(
    amount: Decimal,
    rate: Decimal,
    fee: Decimal,
    include_fee: bool,
) -> Result<TransferAmounts, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("amount must be positive"));
    }

    let (principal, total_to_pay) = if include_fee {
        if fee >= amount {
            return Err(Error::validation(
                "amount must exceed the fee when the fee is included",
            ));
        }
        (round_money(amount - fee), round_money(amount))
    } else {
        (round_money(amount), round_money(amount + fee))
    };

    let receiver_amount = round_money(principal * rate);

    Ok(TransferAmounts {
        sender_amount: round_money(amount),
        principal,
        fee,
        receiver_amount,
        total_to_pay,
    })
}

pub struct QuoteService {
    reference_data: Arc<dyn ReferenceStore>,
    rates: Arc<dyn RateStore>,
    fees: Arc<dyn FeeStore>,
}

impl QuoteService {
    pub fn new(
        reference_data: Arc<dyn ReferenceStore>,
        rates: Arc<dyn RateStore>,
        fees: Arc<dyn FeeStore>,
    ) -> Self {
        Self {
            reference_data,
            rates,
            fees,
        }
    }

    async fn sendable_country(&self, id: Uuid) -> Result<Country, Error> {
        let country = self
            .reference_data
            .country(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("country {id}")))?;
        if !country.can_send {
            return Err(Error::validation(format!(
                "sending from {} is not available",
                country.name
            )));
        }
        Ok(country)
    }

    async fn receivable_country(&self, id: Uuid) -> Result<Country, Error> {
        let country = self
            .reference_data
            .country(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("country {id}")))?;
        if !country.can_receive {
            return Err(Error::validation(format!(
                "sending to {} is not available",
                country.name
            )));
        }
        Ok(country)
    }

    /// Produce a full quote for a corridor.
    ///
    /// The fee is always computed on the entered amount, in both fee modes.
    pub async fn quote(&self, req: QuoteRequest) -> Result<TransferQuote, Error> {
        if req.amount <= Decimal::ZERO {
            return Err(Error::validation("amount must be positive"));
        }

        let from = self.sendable_country(req.from_country_id).await?;
        let to = self.receivable_country(req.to_country_id).await?;

        let rate = lookup_rate(
            self.rates.as_ref(),
            from.currency_id,
            to.currency_id,
            &from.currency_code,
            &to.currency_code,
        )
        .await?;

        let rules = self
            .fees
            .corridor_rules(req.from_country_id, req.to_country_id)
            .await?;
        let rule = resolve_fee(&rules, req.amount)?;
        let fee = rule.fee_amount(req.amount);

        let amounts = calculate_transfer_amounts(req.amount, rate.rate, fee, req.include_fee)?;

        tracing::debug!(
            from = %from.currency_code,
            to = %to.currency_code,
            amount = %req.amount,
            include_fee = req.include_fee,
            fee = %amounts.fee,
            receiver = %amounts.receiver_amount,
            "Quote computed"
        );

        Ok(TransferQuote {
            from_country_id: from.id,
            to_country_id: to.id,
            from_currency: from.currency_code.clone(),
            to_currency: to.currency_code.clone(),
            include_fee: req.include_fee,
            breakdown: QuoteBreakdown {
                you_send: format_amount(amounts.sender_amount, &from.currency_code),
                fee: format_amount(amounts.fee, &from.currency_code),
                total_to_pay: format_amount(amounts.total_to_pay, &from.currency_code),
                exchange_rate: format_rate(rate.rate, &from.currency_code, &to.currency_code),
                they_receive: format_amount(amounts.receiver_amount, &to.currency_code),
            },
            exchange_rate: rate.rate,
            fee_percent: rule.fee_percent_equivalent(req.amount),
            fee_type: rule.fee_type,
            amounts,
            estimated_delivery: ESTIMATED_DELIVERY.to_string(),
            rate_expires_at: Utc::now() + Duration::seconds(RATE_LOCK_SECS),
        })
    }

    /// Quote plus method-ownership validation, the last step before a
    /// transaction is submitted. A method from the wrong country is a
    /// validation failure, not a silent fallback.
    pub async fn preview(&self, req: PreviewRequest) -> Result<TransferPreview, Error> {
        if req.recipient_name.trim().is_empty() {
            return Err(Error::validation("recipient name is required"));
        }
        if req.recipient_phone.trim().is_empty() {
            return Err(Error::validation("recipient phone is required"));
        }

        let quote = self
            .quote(QuoteRequest {
                from_country_id: req.from_country_id,
                to_country_id: req.to_country_id,
                amount: req.amount,
                include_fee: req.include_fee,
            })
            .await?;

        let payment = self
            .reference_data
            .payment_method(req.payment_method_id)
            .await?
            .ok_or_else(|| Error::not_found("payment method"))?;
        if payment.country_id != req.from_country_id {
            return Err(Error::validation(
                "payment method does not belong to the sending country",
            ));
        }

        let receiving = self
            .reference_data
            .receiving_method(req.receiving_method_id)
            .await?
            .ok_or_else(|| Error::not_found("receiving method"))?;
        if receiving.country_id != req.to_country_id {
            return Err(Error::validation(
                "receiving method does not belong to the destination country",
            ));
        }

        Ok(TransferPreview {
            quote,
            payment_method_id: payment.id,
            payment_kind: payment.kind,
            receiving_method_id: receiving.id,
            receiving_kind: receiving.kind,
            recipient_name: req.recipient_name,
            recipient_phone: req.recipient_phone,
        })
    }

    /// Ballpark figure by currency codes, with a flat fee percentage.
    /// No corridor or fee schedule is consulted; the real quote can differ.
    pub async fn estimate(
        &self,
        from_code: &str,
        to_code: &str,
        amount: Decimal,
    ) -> Result<TransferEstimate, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::validation("amount must be positive"));
        }

        let from = self
            .reference_data
            .currency_by_code(from_code)
            .await?
            .ok_or_else(|| Error::not_found(format!("currency {from_code}")))?;
        let to = self
            .reference_data
            .currency_by_code(to_code)
            .await?
            .ok_or_else(|| Error::not_found(format!("currency {to_code}")))?;

        let rate = lookup_rate(self.rates.as_ref(), from.id, to.id, &from.code, &to.code).await?;

        let fee_percent: Decimal = ESTIMATE_FEE_PERCENT
            .parse()
            .map_err(|_| Error::validation("invalid estimate fee"))?;
        let fee = percentage_of(amount, fee_percent);
        let amounts = calculate_transfer_amounts(amount, rate.rate, fee, false)?;

        Ok(TransferEstimate {
            from_currency: from.code.clone(),
            to_currency: to.code.clone(),
            rate_display: format_rate(rate.rate, &from.code, &to.code),
            exchange_rate: rate.rate,
            fee_percent,
            amounts,
        })
    }
}
