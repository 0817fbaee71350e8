//! WebSocket event payloads
//!
//! Two logical channels carry these frames: the per-user channel (a sender
//! only sees their own transaction events) and the admin broadcast channel
//! (every transition, plus new-transaction notifications).

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::transaction::model::Transaction;
use crate::transaction::status::TransactionStatus;

/// Event frame pushed over a WebSocket connection.
///
/// Serialized shapes are part of the client contract:
/// - user frame:  `{"event":"transaction_status_updated","data":{...}}`
/// - admin frame: `{"type":"status_update","transaction":{...}}`
/// - admin frame: `{"type":"NEW_TRANSACTION","data":{...}}`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WsEvent {
    UserStatusUpdated {
        event: &'static str,
        data: StatusChangeData,
    },
    AdminStatusUpdate {
        #[serde(rename = "type")]
        kind: &'static str,
        transaction: TransactionSummary,
    },
    AdminNewTransaction {
        #[serde(rename = "type")]
        kind: &'static str,
        data: NewTransactionData,
    },
    Connected {
        event: &'static str,
        user_id: Uuid,
    },
    /// Liveness marker; goes out as the literal text frame `pong`,
    /// never as JSON.
    #[serde(skip)]
    Pong,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeData {
    pub transaction_id: Uuid,
    pub old_status: TransactionStatus,
    pub new_status: TransactionStatus,
    pub reference: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    pub id: Uuid,
    pub reference: String,
    pub status: TransactionStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransactionData {
    pub id: Uuid,
    pub reference: String,
    pub amount: String,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl WsEvent {
    /// Welcome frame sent right after a successful upgrade.
    pub fn connected(user_id: Uuid) -> Self {
        WsEvent::Connected {
            event: "connected",
            user_id,
        }
    }

    /// Reply to a client-level `ping` text frame.
    pub fn pong() -> Self {
        WsEvent::Pong
    }

    /// Per-user frame for an accepted status transition.
    pub fn status_updated(txn: &Transaction, old_status: TransactionStatus) -> Self {
        WsEvent::UserStatusUpdated {
            event: "transaction_status_updated",
            data: StatusChangeData {
                transaction_id: txn.id,
                old_status,
                new_status: txn.status,
                reference: txn.reference.clone(),
                updated_at: txn.updated_at,
            },
        }
    }

    /// Admin broadcast frame for an accepted status transition.
    pub fn admin_status_update(txn: &Transaction) -> Self {
        WsEvent::AdminStatusUpdate {
            kind: "status_update",
            transaction: TransactionSummary {
                id: txn.id,
                reference: txn.reference.clone(),
                status: txn.status,
                updated_at: txn.updated_at,
            },
        }
    }

    /// Admin broadcast frame for a freshly created transaction.
    pub fn new_transaction(txn: &Transaction) -> Self {
        WsEvent::AdminNewTransaction {
            kind: "NEW_TRANSACTION",
            data: NewTransactionData {
                id: txn.id,
                reference: txn.reference.clone(),
                amount: txn.sender_amount.to_string(),
                currency: txn.sender_currency.clone(),
                status: txn.status,
                created_at: txn.created_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::model::NewTransaction;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sample() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            NewTransaction {
                sender_country_id: Uuid::new_v4(),
                receiver_country_id: Uuid::new_v4(),
                sender_currency: "EUR".into(),
                receiver_currency: "XOF".into(),
                sender_amount: Decimal::from_str("100").unwrap(),
                receiver_amount: Decimal::from_str("65500").unwrap(),
                exchange_rate: Decimal::from_str("655").unwrap(),
                applied_fee: Decimal::from_str("3.50").unwrap(),
                total_to_pay: Decimal::from_str("103.50").unwrap(),
                payment_method_id: Uuid::new_v4(),
                receiving_method_id: Uuid::new_v4(),
                recipient_name: "Test".into(),
                recipient_phone: "+33600000000".into(),
                notes: None,
            },
        )
    }

    #[test]
    fn test_user_frame_shape() {
        let mut txn = sample();
        let old = txn.status;
        txn.apply_status(TransactionStatus::InProgress, None, Utc::now());

        let json = serde_json::to_value(WsEvent::status_updated(&txn, old)).unwrap();
        assert_eq!(json["event"], "transaction_status_updated");
        assert_eq!(json["data"]["old_status"], "FUNDS_DEPOSITED");
        assert_eq!(json["data"]["new_status"], "IN_PROGRESS");
        assert_eq!(json["data"]["reference"], txn.reference);
    }

    #[test]
    fn test_admin_frame_shape() {
        let txn = sample();
        let json = serde_json::to_value(WsEvent::admin_status_update(&txn)).unwrap();
        assert_eq!(json["type"], "status_update");
        assert_eq!(json["transaction"]["reference"], txn.reference);

        let json = serde_json::to_value(WsEvent::new_transaction(&txn)).unwrap();
        assert_eq!(json["type"], "NEW_TRANSACTION");
        assert_eq!(json["data"]["currency"], "EUR");
    }
}
