//! Transaction persistence contract
//!
//! Status updates are compare-and-swap on the current status: `transition`
//! writes the already-mutated record only if the stored status still equals
//! `expected`, so two racing transitions cannot both win.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{Transaction, TransactionStatusHistory};
use super::status::TransactionStatus;
use crate::error::Error;

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, txn: &Transaction) -> Result<(), Error>;

    async fn get(&self, id: Uuid) -> Result<Option<Transaction>, Error>;

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Transaction>, Error>;

    async fn list(
        &self,
        status: Option<TransactionStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error>;

    async fn list_by_sender(
        &self,
        sender_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error>;

    /// Persist a status transition. Returns false when the stored status no
    /// longer equals `expected` (a concurrent transition won); the record is
    /// left untouched in that case.
    async fn transition(
        &self,
        txn: &Transaction,
        expected: TransactionStatus,
    ) -> Result<bool, Error>;

    async fn append_history(&self, entry: &TransactionStatusHistory) -> Result<(), Error>;

    async fn history(&self, transaction_id: Uuid)
        -> Result<Vec<TransactionStatusHistory>, Error>;
}
