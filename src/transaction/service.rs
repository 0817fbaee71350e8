//! Transaction lifecycle service
//!
//! Owns every status change: validates transitions against the table in
//! [`super::status`], persists them with a compare-and-swap on the current
//! status, appends the audit history, and fans out WebSocket notifications
//! after the write is durable.
//!
//! Expiry is lazy. There is no background job; any read or action on a
//! transaction that is still awaiting deposit past the 15-minute window
//! first force-cancels it, then proceeds against the cancelled record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::expiry;
use super::model::{NewTransaction, Transaction, TransactionStatusHistory};
use super::status::TransactionStatus;
use super::store::TransactionStore;
use crate::corridor::ReferenceStore;
use crate::error::Error;
use crate::websocket::{ConnectionManager, WsEvent};

const EXPIRY_REASON: &str = "payment confirmation window expired";

/// Snapshot returned by status polling, including the confirmation-window
/// arithmetic the client needs to render a countdown.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusReport {
    pub transaction_id: Uuid,
    pub reference: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub elapsed_seconds: i64,
    pub remaining_seconds: i64,
    pub is_expired: bool,
}

/// Deposit instructions for a transaction awaiting payment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentInstructions {
    pub transaction_id: Uuid,
    pub reference: String,
    pub amount_to_pay: String,
    pub method_kind: String,
    pub owner_name: String,
    pub phone_number: Option<String>,
    pub account_number: Option<String>,
    pub remaining_seconds: i64,
}

pub struct TransactionService {
    store: Arc<dyn TransactionStore>,
    reference_data: Arc<dyn ReferenceStore>,
    ws: Arc<ConnectionManager>,
}

impl TransactionService {
    pub fn new(
        store: Arc<dyn TransactionStore>,
        reference_data: Arc<dyn ReferenceStore>,
        ws: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            store,
            reference_data,
            ws,
        }
    }

    /// Create a transaction in the entry state and announce it on the
    /// admin channel.
    pub async fn create(
        &self,
        sender_id: Uuid,
        data: NewTransaction,
    ) -> Result<Transaction, Error> {
        let method = self
            .reference_data
            .payment_method(data.payment_method_id)
            .await?
            .ok_or_else(|| Error::not_found("payment method"))?;
        if method.country_id != data.sender_country_id {
            return Err(Error::validation(
                "payment method does not belong to the sending country",
            ));
        }
        let receiving = self
            .reference_data
            .receiving_method(data.receiving_method_id)
            .await?
            .ok_or_else(|| Error::not_found("receiving method"))?;
        if receiving.country_id != data.receiver_country_id {
            return Err(Error::validation(
                "receiving method does not belong to the destination country",
            ));
        }

        let txn = Transaction::new(sender_id, data);
        self.store.insert(&txn).await?;

        tracing::info!(
            transaction_id = %txn.id,
            reference = %txn.reference,
            %sender_id,
            amount = %txn.sender_amount,
            currency = %txn.sender_currency,
            "Transaction created"
        );

        self.ws.broadcast_to_admins(WsEvent::new_transaction(&txn));
        Ok(txn)
    }

    /// Fetch a transaction the caller is allowed to see.
    ///
    /// Non-operators only see their own records; an ownership miss reports
    /// NotFound rather than Forbidden so other users' transaction ids stay
    /// unguessable. Applies lazy expiry before returning.
    pub async fn get_owned(
        &self,
        id: Uuid,
        caller: Uuid,
        is_operator: bool,
    ) -> Result<Transaction, Error> {
        let txn = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("transaction {id}")))?;

        if !is_operator && txn.sender_id != caller {
            return Err(Error::not_found(format!("transaction {id}")));
        }

        self.maybe_expire(txn).await
    }

    /// Fetch by human-readable reference with the same ownership collapse.
    pub async fn get_by_reference(
        &self,
        reference: &str,
        caller: Uuid,
        is_operator: bool,
    ) -> Result<Transaction, Error> {
        let txn = self
            .store
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| Error::not_found(format!("transaction {reference}")))?;

        if !is_operator && txn.sender_id != caller {
            return Err(Error::not_found(format!("transaction {reference}")));
        }

        self.maybe_expire(txn).await
    }

    /// Operator listing with optional status filter.
    pub async fn list(
        &self,
        status: Option<TransactionStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error> {
        self.store.list(status, offset, limit).await
    }

    /// Sender-scoped listing.
    pub async fn list_by_sender(
        &self,
        sender_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error> {
        self.store.list_by_sender(sender_id, offset, limit).await
    }

    /// Operator-driven status change.
    ///
    /// Validates the transition against the table, then commits with a
    /// compare-and-swap on the old status. A lost race surfaces as Conflict
    /// and leaves the winner's state untouched. On success the audit entry
    /// is appended and both channels are notified.
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: TransactionStatus,
        admin_id: Uuid,
        reason: Option<String>,
    ) -> Result<Transaction, Error> {
        let txn = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("transaction {id}")))?;
        let txn = self.maybe_expire(txn).await?;

        self.transition(txn, new_status, Some(admin_id), reason)
            .await
    }

    /// Sender confirms they have deposited the funds, moving the
    /// transaction out of the entry state.
    ///
    /// Past the 15-minute window the transaction is force-cancelled first
    /// and the caller gets WindowExpired, never InvalidTransition.
    pub async fn confirm_payment(&self, id: Uuid, sender_id: Uuid) -> Result<Transaction, Error> {
        let txn = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("transaction {id}")))?;
        if txn.sender_id != sender_id {
            return Err(Error::not_found(format!("transaction {id}")));
        }

        if txn.status == TransactionStatus::FundsDeposited
            && expiry::is_expired(txn.created_at, Utc::now())
        {
            self.expire(txn).await?;
            return Err(Error::WindowExpired);
        }

        self.transition(txn, TransactionStatus::InProgress, None, None)
            .await
    }

    /// Sender-initiated cancellation. Allowed from any non-terminal state
    /// per the transition table.
    pub async fn cancel(
        &self,
        id: Uuid,
        sender_id: Uuid,
        reason: Option<String>,
    ) -> Result<Transaction, Error> {
        let txn = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("transaction {id}")))?;
        if txn.sender_id != sender_id {
            return Err(Error::not_found(format!("transaction {id}")));
        }
        let txn = self.maybe_expire(txn).await?;

        self.transition(txn, TransactionStatus::Cancelled, None, reason)
            .await
    }

    /// Poll the current status with confirmation-window arithmetic.
    /// This read is what makes lazy expiry visible to clients.
    pub async fn status_report(
        &self,
        id: Uuid,
        caller: Uuid,
        is_operator: bool,
    ) -> Result<StatusReport, Error> {
        let txn = self.get_owned(id, caller, is_operator).await?;
        let now = Utc::now();
        Ok(StatusReport {
            transaction_id: txn.id,
            reference: txn.reference.clone(),
            status: txn.status,
            created_at: txn.created_at,
            updated_at: txn.updated_at,
            elapsed_seconds: expiry::elapsed_seconds(txn.created_at, now),
            remaining_seconds: expiry::remaining_seconds(txn.created_at, now),
            is_expired: expiry::is_expired(txn.created_at, now),
        })
    }

    /// Deposit instructions for a transaction still awaiting payment.
    pub async fn payment_details(
        &self,
        id: Uuid,
        sender_id: Uuid,
    ) -> Result<PaymentInstructions, Error> {
        let txn = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("transaction {id}")))?;
        if txn.sender_id != sender_id {
            return Err(Error::not_found(format!("transaction {id}")));
        }

        let now = Utc::now();
        if txn.status == TransactionStatus::FundsDeposited && expiry::is_expired(txn.created_at, now)
        {
            self.expire(txn).await?;
            return Err(Error::WindowExpired);
        }
        if txn.status != TransactionStatus::FundsDeposited {
            return Err(Error::validation(
                "payment details are only available while awaiting deposit",
            ));
        }

        let method = self
            .reference_data
            .payment_method(txn.payment_method_id)
            .await?
            .ok_or_else(|| Error::not_found("payment method"))?;

        Ok(PaymentInstructions {
            transaction_id: txn.id,
            reference: txn.reference.clone(),
            amount_to_pay: crate::money::format_amount(txn.total_to_pay, &txn.sender_currency),
            method_kind: method.kind,
            owner_name: method.owner_name,
            phone_number: method.phone_number,
            account_number: method.account_number,
            remaining_seconds: expiry::remaining_seconds(txn.created_at, now),
        })
    }

    /// Audit trail, ownership-collapsed like `get_owned`.
    pub async fn history(
        &self,
        id: Uuid,
        caller: Uuid,
        is_operator: bool,
    ) -> Result<Vec<TransactionStatusHistory>, Error> {
        // Existence and ownership check first; expiry applied on the way
        self.get_owned(id, caller, is_operator).await?;
        self.store.history(id).await
    }

    /// Force-cancel a transaction still in the entry state past its window
    /// if needed, returning the (possibly updated) record.
    async fn maybe_expire(&self, txn: Transaction) -> Result<Transaction, Error> {
        if txn.status == TransactionStatus::FundsDeposited
            && expiry::is_expired(txn.created_at, Utc::now())
        {
            return self.expire(txn).await;
        }
        Ok(txn)
    }

    async fn expire(&self, txn: Transaction) -> Result<Transaction, Error> {
        tracing::info!(
            transaction_id = %txn.id,
            reference = %txn.reference,
            "Payment window elapsed, cancelling"
        );
        match self
            .commit(
                txn.clone(),
                TransactionStatus::Cancelled,
                None,
                Some(EXPIRY_REASON.to_string()),
            )
            .await
        {
            Ok(updated) => Ok(updated),
            // Lost the race to a concurrent reader doing the same cancel:
            // reload and use whatever won.
            Err(Error::Conflict(_)) => self
                .store
                .get(txn.id)
                .await?
                .ok_or_else(|| Error::not_found(format!("transaction {}", txn.id))),
            Err(e) => Err(e),
        }
    }

    /// Validate against the transition table, then commit.
    async fn transition(
        &self,
        txn: Transaction,
        new_status: TransactionStatus,
        actor: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Transaction, Error> {
        if !txn.status.can_transition_to(new_status) {
            return Err(Error::InvalidTransition {
                from: txn.status,
                to: new_status,
                allowed: txn.status.allowed_transitions(),
            });
        }
        self.commit(txn, new_status, actor, reason).await
    }

    /// CAS write + audit append + fan-out. Callers have already validated
    /// the transition.
    async fn commit(
        &self,
        mut txn: Transaction,
        new_status: TransactionStatus,
        actor: Option<Uuid>,
        reason: Option<String>,
    ) -> Result<Transaction, Error> {
        let old_status = txn.status;
        txn.apply_status(new_status, actor, Utc::now());

        let won = self.store.transition(&txn, old_status).await?;
        if !won {
            tracing::warn!(
                transaction_id = %txn.id,
                expected = %old_status,
                attempted = %new_status,
                "Concurrent status update lost the race"
            );
            return Err(Error::Conflict(
                "transaction status changed concurrently, please retry".to_string(),
            ));
        }

        let entry =
            TransactionStatusHistory::record(txn.id, old_status, new_status, actor, reason);
        self.store.append_history(&entry).await?;

        tracing::info!(
            transaction_id = %txn.id,
            reference = %txn.reference,
            from = %old_status,
            to = %new_status,
            "Transaction status updated"
        );

        // Notify only after the write is durable; delivery is best-effort.
        self.ws
            .send_to_user(txn.sender_id, WsEvent::status_updated(&txn, old_status));
        self.ws
            .broadcast_to_admins(WsEvent::admin_status_update(&txn));

        Ok(txn)
    }
}
