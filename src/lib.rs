//! RemitFlow - Cross-border money transfer backend
//!
//! Corridor quoting with a fee schedule, a transaction lifecycle with a
//! 15-minute payment window, and real-time status fan-out over WebSocket.
//!
//! # Modules
//!
//! - [`money`] - Monetary rounding and display helpers
//! - [`corridor`] - Countries, currencies, payment/receiving methods
//! - [`rates`] - Directional exchange rates
//! - [`fees`] - Corridor fee schedule and band resolution
//! - [`quote`] - Transfer quoting engine
//! - [`transaction`] - Status state machine, window expiry, lifecycle service
//! - [`websocket`] - Connection registry and event fan-out
//! - [`auth`] - JWT issuing, verification, and route guards
//! - [`store`] - Postgres and in-memory store implementations
//! - [`gateway`] - Axum HTTP/WS surface

pub mod auth;
pub mod config;
pub mod corridor;
pub mod error;
pub mod fees;
pub mod gateway;
pub mod logging;
pub mod money;
pub mod quote;
pub mod rates;
pub mod store;
pub mod transaction;
pub mod websocket;

// Convenient re-exports at crate root
pub use error::Error;
pub use fees::{FeeRule, FeeType};
pub use quote::{QuoteService, TransferQuote};
pub use rates::ExchangeRate;
pub use transaction::{Transaction, TransactionService, TransactionStatus};
pub use websocket::ConnectionManager;
