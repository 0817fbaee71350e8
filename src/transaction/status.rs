//! Transaction status state machine
//!
//! A fixed transition table governs the lifecycle. Anything not in the table
//! is rejected and the rejection reports the allowed target set.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Transaction lifecycle states.
///
/// `FundsDeposited` is the entry state assigned at creation. `Completed`,
/// `Cancelled` and `Expired` are terminal. `Expired` is time-driven only and
/// is never set at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Entry state: sender has created the transfer and claims the deposit
    FundsDeposited,
    /// An operator is processing the payout
    InProgress,
    /// Terminal: payout delivered
    Completed,
    /// Terminal: cancelled by sender, operator, or the expiry monitor
    Cancelled,
    /// Terminal: time-driven administrative expiry
    Expired,
}

impl TransactionStatus {
    /// Allowed target states from this state.
    ///
    /// | From            | Allowed To              |
    /// |-----------------|-------------------------|
    /// | FundsDeposited  | InProgress, Cancelled   |
    /// | InProgress      | Completed, Cancelled    |
    /// | terminal states | (none)                  |
    pub fn allowed_transitions(&self) -> Vec<TransactionStatus> {
        match self {
            TransactionStatus::FundsDeposited => {
                vec![TransactionStatus::InProgress, TransactionStatus::Cancelled]
            }
            TransactionStatus::InProgress => {
                vec![TransactionStatus::Completed, TransactionStatus::Cancelled]
            }
            TransactionStatus::Completed
            | TransactionStatus::Cancelled
            | TransactionStatus::Expired => vec![],
        }
    }

    /// Whether `to` is a legal next state.
    #[inline]
    pub fn can_transition_to(&self, to: TransactionStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Terminal states accept no further transitions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed
                | TransactionStatus::Cancelled
                | TransactionStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::FundsDeposited => "FUNDS_DEPOSITED",
            TransactionStatus::InProgress => "IN_PROGRESS",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Cancelled => "CANCELLED",
            TransactionStatus::Expired => "EXPIRED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FUNDS_DEPOSITED" => Some(TransactionStatus::FundsDeposited),
            "IN_PROGRESS" => Some(TransactionStatus::InProgress),
            "COMPLETED" => Some(TransactionStatus::Completed),
            "CANCELLED" => Some(TransactionStatus::Cancelled),
            "EXPIRED" => Some(TransactionStatus::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
