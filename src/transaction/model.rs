//! Transaction and audit-history records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::status::TransactionStatus;

/// Generate a globally unique human-readable reference, e.g. `RTX1f3a9c02bd`.
/// Assigned once at creation and never changed.
pub fn generate_reference() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("RTX{}", &hex[..10])
}

/// Input for creating a transaction. Amounts, rate and fee are captured from
/// the validated preview and become immutable on the stored record.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub sender_country_id: Uuid,
    pub receiver_country_id: Uuid,
    pub sender_currency: String,
    pub receiver_currency: String,
    pub sender_amount: Decimal,
    pub receiver_amount: Decimal,
    pub exchange_rate: Decimal,
    pub applied_fee: Decimal,
    pub total_to_pay: Decimal,
    pub payment_method_id: Uuid,
    pub receiving_method_id: Uuid,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub notes: Option<String>,
}

/// A persisted transfer record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    pub sender_id: Uuid,
    pub sender_country_id: Uuid,
    pub receiver_country_id: Uuid,
    pub sender_currency: String,
    pub receiver_currency: String,
    pub sender_amount: Decimal,
    pub receiver_amount: Decimal,
    /// Rate captured at creation; immutable thereafter
    pub exchange_rate: Decimal,
    pub applied_fee: Decimal,
    pub total_to_pay: Decimal,
    pub payment_method_id: Uuid,
    pub receiving_method_id: Uuid,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub status: TransactionStatus,
    pub notes: Option<String>,
    /// Operator who moved the transaction to InProgress
    pub processed_by_admin_id: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new record in the entry state with a fresh reference.
    pub fn new(sender_id: Uuid, data: NewTransaction) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference: generate_reference(),
            sender_id,
            sender_country_id: data.sender_country_id,
            receiver_country_id: data.receiver_country_id,
            sender_currency: data.sender_currency,
            receiver_currency: data.receiver_currency,
            sender_amount: data.sender_amount,
            receiver_amount: data.receiver_amount,
            exchange_rate: data.exchange_rate,
            applied_fee: data.applied_fee,
            total_to_pay: data.total_to_pay,
            payment_method_id: data.payment_method_id,
            receiving_method_id: data.receiving_method_id,
            recipient_name: data.recipient_name,
            recipient_phone: data.recipient_phone,
            status: TransactionStatus::FundsDeposited,
            notes: data.notes,
            processed_by_admin_id: None,
            processed_at: None,
            completed_at: None,
            cancelled_at: None,
            expired_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a transition INTO `new_status`: set the status, bump
    /// `updated_at`, and stamp the per-state timestamp exactly once.
    ///
    /// Legality of the transition is the service's concern; this only
    /// records an already-validated change.
    pub fn apply_status(
        &mut self,
        new_status: TransactionStatus,
        actor: Option<Uuid>,
        now: DateTime<Utc>,
    ) {
        match new_status {
            TransactionStatus::InProgress => {
                self.processed_at.get_or_insert(now);
                if self.processed_by_admin_id.is_none() {
                    self.processed_by_admin_id = actor;
                }
            }
            TransactionStatus::Completed => {
                self.completed_at.get_or_insert(now);
            }
            TransactionStatus::Cancelled => {
                self.cancelled_at.get_or_insert(now);
            }
            TransactionStatus::Expired => {
                self.expired_at.get_or_insert(now);
            }
            TransactionStatus::FundsDeposited => {}
        }
        self.status = new_status;
        self.updated_at = now;
    }
}

/// Append-only audit record, one per accepted transition. Never mutated.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionStatusHistory {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub old_status: TransactionStatus,
    pub new_status: TransactionStatus,
    /// None for system or self-service transitions
    pub changed_by_admin_id: Option<Uuid>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionStatusHistory {
    pub fn record(
        transaction_id: Uuid,
        old_status: TransactionStatus,
        new_status: TransactionStatus,
        changed_by_admin_id: Option<Uuid>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            old_status,
            new_status,
            changed_by_admin_id,
            reason,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
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
                recipient_name: "Amadou Diallo".into(),
                recipient_phone: "+221701234567".into(),
                notes: None,
            },
        )
    }

    #[test]
    fn test_new_transaction_entry_state() {
        let txn = sample();
        assert_eq!(txn.status, TransactionStatus::FundsDeposited);
        assert!(txn.reference.starts_with("RTX"));
        assert_eq!(txn.reference.len(), 13);
        assert!(txn.processed_at.is_none());
        assert!(txn.cancelled_at.is_none());
        assert!(txn.expired_at.is_none());
    }

    #[test]
    fn test_reference_uniqueness() {
        let refs: HashSet<String> = (0..10_000).map(|_| generate_reference()).collect();
        assert_eq!(refs.len(), 10_000);
    }

    #[test]
    fn test_apply_status_stamps_once() {
        let mut txn = sample();
        let admin = Uuid::new_v4();
        let t1 = Utc::now();
        txn.apply_status(TransactionStatus::InProgress, Some(admin), t1);
        assert_eq!(txn.processed_at, Some(t1));
        assert_eq!(txn.processed_by_admin_id, Some(admin));

        // A second application must not move the original stamp
        let t2 = t1 + chrono::Duration::seconds(60);
        txn.apply_status(TransactionStatus::Completed, None, t2);
        assert_eq!(txn.processed_at, Some(t1));
        assert_eq!(txn.completed_at, Some(t2));
        assert_eq!(txn.updated_at, t2);
    }

    #[test]
    fn test_exactly_one_terminal_timestamp() {
        let mut txn = sample();
        txn.apply_status(TransactionStatus::Cancelled, None, Utc::now());
        assert!(txn.cancelled_at.is_some());
        assert!(txn.completed_at.is_none());
        assert!(txn.expired_at.is_none());
    }
}
