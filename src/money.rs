//! Monetary rounding and display formatting
//!
//! All monetary quantities in this crate are `rust_decimal::Decimal` and every
//! intermediate result (fee, converted principal, receiver amount, total) is
//! rounded half-up to 2 decimal places through [`round_money`]. Using any
//! other rounding mode changes settlement amounts, so all call sites MUST go
//! through this module.

use rust_decimal::{Decimal, RoundingStrategy};

/// Scale for monetary rounding: 2 decimal places (0.01)
pub const MONEY_SCALE: u32 = 2;

/// Divisor for percentage fee rates
pub const HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Decimal places used when rendering an exchange rate
const RATE_DISPLAY_SCALE: u32 = 4;

/// Round a monetary amount half-up to 2 decimal places.
///
/// Amounts in this core are non-negative, so `MidpointAwayFromZero` is
/// exactly "round half up".
#[inline]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage fee: `round(amount * percent / 100)` at money scale.
#[inline]
pub fn percentage_of(amount: Decimal, percent: Decimal) -> Decimal {
    round_money(amount * percent / HUNDRED)
}

/// Format an amount with its currency code, e.g. `"100.00 EUR"`.
pub fn format_amount(amount: Decimal, currency_code: &str) -> String {
    format!("{:.2} {}", round_money(amount), currency_code)
}

/// Format an exchange rate line, e.g. `"1 EUR = 655.0000 XOF"`.
pub fn format_rate(rate: Decimal, from_code: &str, to_code: &str) -> String {
    let shown = rate.round_dp_with_strategy(
        RATE_DISPLAY_SCALE,
        RoundingStrategy::MidpointAwayFromZero,
    );
    format!("1 {} = {:.4} {}", from_code, shown, to_code)
}
