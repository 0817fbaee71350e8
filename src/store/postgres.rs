//! Postgres store
//!
//! Runtime-checked sqlx queries with manual row mapping. Statuses and fee
//! types are stored as their canonical text form. The status transition is
//! a conditional UPDATE keyed on the expected current status, so concurrent
//! writers race on the database row and exactly one wins.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::corridor::{Country, Currency, PaymentMethod, ReceivingMethod, ReferenceStore};
use crate::error::Error;
use crate::fees::{FeeRule, FeeStore, FeeType};
use crate::rates::{ExchangeRate, RateStore};
use crate::transaction::model::{Transaction, TransactionStatusHistory};
use crate::transaction::status::TransactionStatus;
use crate::transaction::store::TransactionStore;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_status(s: &str) -> Result<TransactionStatus, Error> {
    TransactionStatus::from_str(s).ok_or_else(|| Error::validation(format!("unknown status {s}")))
}

fn decode_fee_type(s: &str) -> Result<FeeType, Error> {
    FeeType::from_str(s).ok_or_else(|| Error::validation(format!("unknown fee type {s}")))
}

fn row_to_transaction(r: &PgRow) -> Result<Transaction, Error> {
    Ok(Transaction {
        id: r.get("id"),
        reference: r.get("reference"),
        sender_id: r.get("sender_id"),
        sender_country_id: r.get("sender_country_id"),
        receiver_country_id: r.get("receiver_country_id"),
        sender_currency: r.get("sender_currency"),
        receiver_currency: r.get("receiver_currency"),
        sender_amount: r.get("sender_amount"),
        receiver_amount: r.get("receiver_amount"),
        exchange_rate: r.get("exchange_rate"),
        applied_fee: r.get("applied_fee"),
        total_to_pay: r.get("total_to_pay"),
        payment_method_id: r.get("payment_method_id"),
        receiving_method_id: r.get("receiving_method_id"),
        recipient_name: r.get("recipient_name"),
        recipient_phone: r.get("recipient_phone"),
        status: decode_status(r.get::<&str, _>("status"))?,
        notes: r.get("notes"),
        processed_by_admin_id: r.get("processed_by_admin_id"),
        processed_at: r.get("processed_at"),
        completed_at: r.get("completed_at"),
        cancelled_at: r.get("cancelled_at"),
        expired_at: r.get("expired_at"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

const TXN_COLUMNS: &str = r#"id, reference, sender_id, sender_country_id, receiver_country_id,
    sender_currency, receiver_currency, sender_amount, receiver_amount,
    exchange_rate, applied_fee, total_to_pay, payment_method_id,
    receiving_method_id, recipient_name, recipient_phone, status, notes,
    processed_by_admin_id, processed_at, completed_at, cancelled_at,
    expired_at, created_at, updated_at"#;

#[async_trait]
impl ReferenceStore for PgStore {
    async fn country(&self, id: Uuid) -> Result<Option<Country>, Error> {
        let row = sqlx::query(
            r#"SELECT c.id, c.name, c.currency_id, cur.code AS currency_code,
                      cur.symbol AS currency_symbol, c.can_send, c.can_receive
               FROM countries c
               JOIN currencies cur ON cur.id = c.currency_id
               WHERE c.id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Country {
            id: r.get("id"),
            name: r.get("name"),
            currency_id: r.get("currency_id"),
            currency_code: r.get("currency_code"),
            currency_symbol: r.get("currency_symbol"),
            can_send: r.get("can_send"),
            can_receive: r.get("can_receive"),
        }))
    }

    async fn currency_by_code(&self, code: &str) -> Result<Option<Currency>, Error> {
        let row = sqlx::query(
            r#"SELECT id, code, symbol, is_active
               FROM currencies WHERE UPPER(code) = UPPER($1) AND is_active"#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Currency {
            id: r.get("id"),
            code: r.get("code"),
            symbol: r.get("symbol"),
            is_active: r.get("is_active"),
        }))
    }

    async fn payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, Error> {
        let row = sqlx::query(
            r#"SELECT id, country_id, kind, owner_name, phone_number, account_number
               FROM payment_methods WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| PaymentMethod {
            id: r.get("id"),
            country_id: r.get("country_id"),
            kind: r.get("kind"),
            owner_name: r.get("owner_name"),
            phone_number: r.get("phone_number"),
            account_number: r.get("account_number"),
        }))
    }

    async fn receiving_method(&self, id: Uuid) -> Result<Option<ReceivingMethod>, Error> {
        let row = sqlx::query(
            r#"SELECT id, country_id, kind FROM receiving_methods WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ReceivingMethod {
            id: r.get("id"),
            country_id: r.get("country_id"),
            kind: r.get("kind"),
        }))
    }
}

#[async_trait]
impl RateStore for PgStore {
    async fn get_rate(
        &self,
        from_currency_id: Uuid,
        to_currency_id: Uuid,
    ) -> Result<Option<ExchangeRate>, Error> {
        let row = sqlx::query(
            r#"SELECT id, from_currency_id, to_currency_id, rate, is_active, updated_at
               FROM exchange_rates
               WHERE from_currency_id = $1 AND to_currency_id = $2 AND is_active"#,
        )
        .bind(from_currency_id)
        .bind(to_currency_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ExchangeRate {
            id: r.get("id"),
            from_currency_id: r.get("from_currency_id"),
            to_currency_id: r.get("to_currency_id"),
            rate: r.get("rate"),
            is_active: r.get("is_active"),
            updated_at: r.get("updated_at"),
        }))
    }
}

#[async_trait]
impl FeeStore for PgStore {
    async fn corridor_rules(
        &self,
        from_country_id: Uuid,
        to_country_id: Uuid,
    ) -> Result<Vec<FeeRule>, Error> {
        let rows = sqlx::query(
            r#"SELECT id, from_country_id, to_country_id, fee_type, fee_value,
                      min_amount, max_amount, is_active
               FROM fee_rules
               WHERE from_country_id = $1 AND to_country_id = $2 AND is_active
               ORDER BY min_amount ASC"#,
        )
        .bind(from_country_id)
        .bind(to_country_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(FeeRule {
                    id: r.get("id"),
                    from_country_id: r.get("from_country_id"),
                    to_country_id: r.get("to_country_id"),
                    fee_type: decode_fee_type(r.get::<&str, _>("fee_type"))?,
                    fee_value: r.get("fee_value"),
                    min_amount: r.get("min_amount"),
                    max_amount: r.get("max_amount"),
                    is_active: r.get("is_active"),
                })
            })
            .collect()
    }
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn insert(&self, txn: &Transaction) -> Result<(), Error> {
        sqlx::query(
            r#"INSERT INTO transactions
               (id, reference, sender_id, sender_country_id, receiver_country_id,
                sender_currency, receiver_currency, sender_amount, receiver_amount,
                exchange_rate, applied_fee, total_to_pay, payment_method_id,
                receiving_method_id, recipient_name, recipient_phone, status, notes,
                created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                       $15, $16, $17, $18, $19, $20)"#,
        )
        .bind(txn.id)
        .bind(&txn.reference)
        .bind(txn.sender_id)
        .bind(txn.sender_country_id)
        .bind(txn.receiver_country_id)
        .bind(&txn.sender_currency)
        .bind(&txn.receiver_currency)
        .bind(txn.sender_amount)
        .bind(txn.receiver_amount)
        .bind(txn.exchange_rate)
        .bind(txn.applied_fee)
        .bind(txn.total_to_pay)
        .bind(txn.payment_method_id)
        .bind(txn.receiving_method_id)
        .bind(&txn.recipient_name)
        .bind(&txn.recipient_phone)
        .bind(txn.status.as_str())
        .bind(&txn.notes)
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Transaction>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Transaction>, Error> {
        let row = sqlx::query(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn list(
        &self,
        status: Option<TransactionStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {TXN_COLUMNS} FROM transactions WHERE status = $1
                     ORDER BY created_at DESC OFFSET $2 LIMIT $3"
                ))
                .bind(status.as_str())
                .bind(offset)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {TXN_COLUMNS} FROM transactions
                     ORDER BY created_at DESC OFFSET $1 LIMIT $2"
                ))
                .bind(offset)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_transaction).collect()
    }

    async fn list_by_sender(
        &self,
        sender_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error> {
        let rows = sqlx::query(&format!(
            "SELECT {TXN_COLUMNS} FROM transactions WHERE sender_id = $1
             ORDER BY created_at DESC OFFSET $2 LIMIT $3"
        ))
        .bind(sender_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn transition(
        &self,
        txn: &Transaction,
        expected: TransactionStatus,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"UPDATE transactions
               SET status = $1, updated_at = $2, processed_by_admin_id = $3,
                   processed_at = $4, completed_at = $5, cancelled_at = $6,
                   expired_at = $7
               WHERE id = $8 AND status = $9"#,
        )
        .bind(txn.status.as_str())
        .bind(txn.updated_at)
        .bind(txn.processed_by_admin_id)
        .bind(txn.processed_at)
        .bind(txn.completed_at)
        .bind(txn.cancelled_at)
        .bind(txn.expired_at)
        .bind(txn.id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn append_history(&self, entry: &TransactionStatusHistory) -> Result<(), Error> {
        sqlx::query(
            r#"INSERT INTO transaction_status_history
               (id, transaction_id, old_status, new_status, changed_by_admin_id,
                reason, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(entry.id)
        .bind(entry.transaction_id)
        .bind(entry.old_status.as_str())
        .bind(entry.new_status.as_str())
        .bind(entry.changed_by_admin_id)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionStatusHistory>, Error> {
        let rows = sqlx::query(
            r#"SELECT id, transaction_id, old_status, new_status,
                      changed_by_admin_id, reason, created_at
               FROM transaction_status_history
               WHERE transaction_id = $1
               ORDER BY created_at ASC"#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(TransactionStatusHistory {
                    id: r.get("id"),
                    transaction_id: r.get("transaction_id"),
                    old_status: decode_status(r.get::<&str, _>("old_status"))?,
                    new_status: decode_status(r.get::<&str, _>("new_status"))?,
                    changed_by_admin_id: r.get("changed_by_admin_id"),
                    reason: r.get("reason"),
                    created_at: r.get("created_at"),
                })
            })
            .collect()
    }
}
