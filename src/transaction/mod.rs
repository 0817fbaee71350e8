//! Transaction lifecycle: state machine, window expiry, persistence, service

pub mod expiry;
pub mod model;
pub mod service;
pub mod status;
pub mod store;

pub use model::{NewTransaction, Transaction, TransactionStatusHistory};
pub use service::{PaymentInstructions, StatusReport, TransactionService};
pub use status::TransactionStatus;
pub use store::TransactionStore;
