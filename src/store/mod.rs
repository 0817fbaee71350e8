//! Store implementations: Postgres for production, in-memory for tests
//! and DB-less runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;
