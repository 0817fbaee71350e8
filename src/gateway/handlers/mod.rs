//! HTTP handlers

pub mod admin;
pub mod health;
pub mod quote;
pub mod transaction;

pub use admin::*;
pub use health::*;
pub use quote::*;
pub use transaction::*;
