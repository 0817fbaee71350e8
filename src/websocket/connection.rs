//! WebSocket connection manager
//!
//! Manages active WebSocket connections using DashMap for concurrent access.
//! Supports multiple connections per user (e.g., mobile + web), plus a
//! separate admin registry that receives every broadcast.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::WsEvent;

/// WebSocket sender channel type
pub type WsSender = mpsc::UnboundedSender<WsEvent>;

/// Unique connection identifier
pub type ConnectionId = u64;

/// WebSocket connection manager
///
/// Thread-safe connection registry that maps user_id to their active
/// WebSocket connections. Admin connections live in their own registry so
/// user-scoped delivery and admin broadcast never interfere. Uses DashMap
/// for lock-free concurrent access.
pub struct ConnectionManager {
    /// user_id -> list of (connection_id, sender)
    connections: DashMap<Uuid, Vec<(ConnectionId, WsSender)>>,
    /// admin broadcast registry: connection_id -> sender
    admin_connections: DashMap<ConnectionId, WsSender>,
    /// Next connection ID
    next_conn_id: AtomicU64,
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            admin_connections: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Add a new WebSocket connection for a user
    ///
    /// Returns the unique connection ID for this connection.
    /// Supports multiple connections per user (e.g., mobile app + web browser).
    pub fn add_connection(&self, user_id: Uuid, tx: WsSender) -> ConnectionId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        self.connections
            .entry(user_id)
            .or_insert_with(Vec::new)
            .push((conn_id, tx));

        tracing::info!(
            %user_id,
            conn_id,
            total_connections = self.connections.get(&user_id).map(|v| v.len()).unwrap_or(0),
            "WebSocket connection added"
        );

        conn_id
    }

    /// Remove a WebSocket connection by ID
    ///
    /// Called when a connection is closed. Cleans up empty user entries.
    pub fn remove_connection(&self, user_id: Uuid, conn_id: ConnectionId) {
        if let Some(mut senders) = self.connections.get_mut(&user_id) {
            senders.retain(|(id, _)| *id != conn_id);

            if senders.is_empty() {
                drop(senders); // Release the lock
                self.connections.remove(&user_id);
                tracing::info!(%user_id, conn_id, "All WebSocket connections closed");
            } else {
                tracing::info!(
                    %user_id,
                    conn_id,
                    remaining_connections = senders.len(),
                    "WebSocket connection removed"
                );
            }
        }
    }

    /// Register an admin broadcast connection
    pub fn add_admin_connection(&self, tx: WsSender) -> ConnectionId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        self.admin_connections.insert(conn_id, tx);
        tracing::info!(
            conn_id,
            admin_connections = self.admin_connections.len(),
            "Admin WebSocket connection added"
        );
        conn_id
    }

    /// Remove an admin broadcast connection by ID
    pub fn remove_admin_connection(&self, conn_id: ConnectionId) {
        if self.admin_connections.remove(&conn_id).is_some() {
            tracing::info!(conn_id, "Admin WebSocket connection removed");
        }
    }

    /// Send an event to all connections of a specific user
    ///
    /// A send failure means the client side of the channel is gone; the
    /// dead sender is pruned here rather than waiting for the handler.
    pub fn send_to_user(&self, user_id: Uuid, event: WsEvent) {
        if let Some(mut senders) = self.connections.get_mut(&user_id) {
            let before = senders.len();
            senders.retain(|(conn_id, tx)| {
                if tx.send(event.clone()).is_err() {
                    tracing::warn!(%user_id, conn_id, "Failed to send - client disconnected");
                    false
                } else {
                    true
                }
            });
            tracing::debug!(
                %user_id,
                recipients = senders.len(),
                pruned = before - senders.len(),
                "Event sent to user"
            );
        }
    }

    /// Broadcast an event to every admin connection
    ///
    /// Dead admin senders are pruned on failure, same as user sends.
    pub fn broadcast_to_admins(&self, event: WsEvent) {
        let mut dead = Vec::new();
        for entry in self.admin_connections.iter() {
            if entry.value().send(event.clone()).is_err() {
                dead.push(*entry.key());
            }
        }
        for conn_id in dead {
            self.admin_connections.remove(&conn_id);
            tracing::warn!(conn_id, "Pruned dead admin connection");
        }
        tracing::debug!(
            recipients = self.admin_connections.len(),
            "Event broadcast to admins"
        );
    }

    /// Get connection statistics
    ///
    /// Returns (number of users, total user connections, admin connections)
    pub fn stats(&self) -> (usize, usize, usize) {
        let users = self.connections.len();
        let total_connections: usize = self
            .connections
            .iter()
            .map(|entry| entry.value().len())
            .sum();
        (users, total_connections, self.admin_connections.len())
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::model::{NewTransaction, Transaction};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sample_txn() -> Transaction {
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
                recipient_name: "Test".into(),
                recipient_phone: "+33600000000".into(),
                notes: None,
            },
        )
    }

    #[test]
    fn test_connection_manager_add_remove() {
        let manager = ConnectionManager::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let user = Uuid::new_v4();

        let conn_id = manager.add_connection(user, tx);
        assert_eq!(manager.stats(), (1, 1, 0));

        manager.remove_connection(user, conn_id);
        assert_eq!(manager.stats(), (0, 0, 0));
    }

    #[test]
    fn test_multiple_connections_per_user() {
        let manager = ConnectionManager::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let user = Uuid::new_v4();

        let conn_id1 = manager.add_connection(user, tx1);
        let conn_id2 = manager.add_connection(user, tx2);
        assert_eq!(manager.stats(), (1, 2, 0));

        manager.remove_connection(user, conn_id1);
        assert_eq!(manager.stats(), (1, 1, 0));

        manager.remove_connection(user, conn_id2);
        assert_eq!(manager.stats(), (0, 0, 0));
    }

    #[test]
    fn test_send_to_user_only_reaches_owner() {
        let manager = ConnectionManager::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        manager.add_connection(user_a, tx_a);
        manager.add_connection(user_b, tx_b);

        let txn = sample_txn();
        manager.send_to_user(user_a, WsEvent::status_updated(&txn, txn.status));

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_admin_broadcast_reaches_all() {
        let manager = ConnectionManager::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        manager.add_admin_connection(tx1);
        manager.add_admin_connection(tx2);
        assert_eq!(manager.stats(), (0, 0, 2));

        let txn = sample_txn();
        manager.broadcast_to_admins(WsEvent::admin_status_update(&txn));

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_dead_sender_pruned_on_send() {
        let manager = ConnectionManager::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let user = Uuid::new_v4();

        manager.add_connection(user, tx);
        drop(rx);

        let txn = sample_txn();
        manager.send_to_user(user, WsEvent::status_updated(&txn, txn.status));
        assert_eq!(manager.stats().1, 0);
    }
}
