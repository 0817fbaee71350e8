//! In-memory store
//!
//! Backs tests and DB-less local runs. Implements every store trait over
//! DashMap; the status compare-and-swap uses the shard lock held by
//! `get_mut`, which gives the same winner-takes-all semantics as the
//! conditional UPDATE in the Postgres store.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::corridor::{Country, Currency, PaymentMethod, ReceivingMethod, ReferenceStore};
use crate::error::Error;
use crate::fees::{FeeRule, FeeStore};
use crate::rates::{ExchangeRate, RateStore};
use crate::transaction::model::{Transaction, TransactionStatusHistory};
use crate::transaction::status::TransactionStatus;
use crate::transaction::store::TransactionStore;

#[derive(Default)]
pub struct MemoryStore {
    countries: DashMap<Uuid, Country>,
    currencies: DashMap<Uuid, Currency>,
    payment_methods: DashMap<Uuid, PaymentMethod>,
    receiving_methods: DashMap<Uuid, ReceivingMethod>,
    /// (from_currency_id, to_currency_id) -> rate
    rates: DashMap<(Uuid, Uuid), ExchangeRate>,
    /// (from_country_id, to_country_id) -> rules
    fee_rules: DashMap<(Uuid, Uuid), Vec<FeeRule>>,
    transactions: DashMap<Uuid, Transaction>,
    history: DashMap<Uuid, Vec<TransactionStatusHistory>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_country(&self, country: Country) {
        self.countries.insert(country.id, country);
    }

    pub fn add_currency(&self, currency: Currency) {
        self.currencies.insert(currency.id, currency);
    }

    pub fn add_payment_method(&self, method: PaymentMethod) {
        self.payment_methods.insert(method.id, method);
    }

    pub fn add_receiving_method(&self, method: ReceivingMethod) {
        self.receiving_methods.insert(method.id, method);
    }

    pub fn add_rate(&self, rate: ExchangeRate) {
        self.rates
            .insert((rate.from_currency_id, rate.to_currency_id), rate);
    }

    pub fn add_fee_rule(&self, rule: FeeRule) {
        let mut rules = self
            .fee_rules
            .entry((rule.from_country_id, rule.to_country_id))
            .or_default();
        rules.push(rule);
        rules.sort_by(|a, b| a.min_amount.cmp(&b.min_amount));
    }

    /// Test hook: rewrite a stored transaction in place, e.g. to backdate
    /// `created_at` when exercising window expiry.
    pub fn put_transaction(&self, txn: Transaction) {
        self.transactions.insert(txn.id, txn);
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn country(&self, id: Uuid) -> Result<Option<Country>, Error> {
        Ok(self.countries.get(&id).map(|c| c.clone()))
    }

    async fn currency_by_code(&self, code: &str) -> Result<Option<Currency>, Error> {
        Ok(self
            .currencies
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code) && c.is_active)
            .map(|c| c.clone()))
    }

    async fn payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, Error> {
        Ok(self.payment_methods.get(&id).map(|m| m.clone()))
    }

    async fn receiving_method(&self, id: Uuid) -> Result<Option<ReceivingMethod>, Error> {
        Ok(self.receiving_methods.get(&id).map(|m| m.clone()))
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn get_rate(
        &self,
        from_currency_id: Uuid,
        to_currency_id: Uuid,
    ) -> Result<Option<ExchangeRate>, Error> {
        Ok(self
            .rates
            .get(&(from_currency_id, to_currency_id))
            .filter(|r| r.is_active)
            .map(|r| r.clone()))
    }
}

#[async_trait]
impl FeeStore for MemoryStore {
    async fn corridor_rules(
        &self,
        from_country_id: Uuid,
        to_country_id: Uuid,
    ) -> Result<Vec<FeeRule>, Error> {
        Ok(self
            .fee_rules
            .get(&(from_country_id, to_country_id))
            .map(|rules| rules.iter().filter(|r| r.is_active).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, txn: &Transaction) -> Result<(), Error> {
        if self.transactions.contains_key(&txn.id) {
            return Err(Error::Conflict(format!(
                "transaction {} already exists",
                txn.id
            )));
        }
        self.transactions.insert(txn.id, txn.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Transaction>, Error> {
        Ok(self.transactions.get(&id).map(|t| t.clone()))
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Transaction>, Error> {
        Ok(self
            .transactions
            .iter()
            .find(|t| t.reference == reference)
            .map(|t| t.clone()))
    }

    async fn list(
        &self,
        status: Option<TransactionStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error> {
        let mut txns: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .map(|t| t.clone())
            .collect();
        txns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(txns
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_by_sender(
        &self,
        sender_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, Error> {
        let mut txns: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.sender_id == sender_id)
            .map(|t| t.clone())
            .collect();
        txns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(txns
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn transition(
        &self,
        txn: &Transaction,
        expected: TransactionStatus,
    ) -> Result<bool, Error> {
        match self.transactions.get_mut(&txn.id) {
            Some(mut stored) if stored.status == expected => {
                *stored = txn.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(Error::not_found(format!("transaction {}", txn.id))),
        }
    }

    async fn append_history(&self, entry: &TransactionStatusHistory) -> Result<(), Error> {
        self.history
            .entry(entry.transaction_id)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn history(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionStatusHistory>, Error> {
        Ok(self
            .history
            .get(&transaction_id)
            .map(|h| h.clone())
            .unwrap_or_default())
    }
}
