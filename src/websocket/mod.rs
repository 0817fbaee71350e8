//! Real-time transaction notifications over WebSocket
//!
//! Delivery is fire-and-forget: events are pushed after the state change
//! is durable, and a failed push never rolls back the transition.

pub mod connection;
pub mod handler;
pub mod messages;

pub use connection::{ConnectionId, ConnectionManager, WsSender};
pub use messages::WsEvent;
