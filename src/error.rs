//! Core error taxonomy
//!
//! Every failure the quote engine or the transaction lifecycle can surface
//! maps to exactly one of these variants. The gateway translates them to
//! HTTP statuses in one place (`gateway::types`).

use rust_decimal::Decimal;
use thiserror::Error;

use crate::transaction::status::TransactionStatus;

/// Core service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Referenced entity does not exist, or the caller does not own it.
    /// Ownership failures intentionally collapse into this variant so the
    /// API never leaks existence of other users' transactions.
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate unique key, or an optimistic status update lost the race.
    #[error("{0}")]
    Conflict(String),

    /// Requested status change is not in the transition table.
    /// Always reports the allowed target set for the current state.
    #[error("invalid transition: {from} -> {to}; allowed: [{}]", format_statuses(.allowed))]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
        allowed: Vec<TransactionStatus>,
    },

    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// Payment confirmation attempted after the 15-minute window.
    /// Distinct from InvalidTransition: raising this carries a side effect
    /// (the transaction has already been force-cancelled).
    #[error("the 15-minute payment window has elapsed; transaction cancelled")]
    WindowExpired,

    /// Fee corridor exists but no band covers the amount.
    #[error("no fee band covers amount {amount} for this corridor")]
    NoBandMatch { amount: Decimal },

    /// Missing, malformed, or expired credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credentials, insufficient role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Database failure from a store implementation.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

fn format_statuses(statuses: &[TransactionStatus]) -> String {
    statuses
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// NotFound with a formatted entity description
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Error::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Error::Forbidden(msg.into())
    }
}
