//! Shared gateway state

use std::sync::Arc;

use crate::auth::AuthService;
use crate::quote::QuoteService;
use crate::transaction::TransactionService;
use crate::websocket::ConnectionManager;

/// Application state shared across handlers
pub struct AppState {
    pub quotes: Arc<QuoteService>,
    pub transactions: Arc<TransactionService>,
    pub auth: Arc<AuthService>,
    pub ws_manager: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(
        quotes: Arc<QuoteService>,
        transactions: Arc<TransactionService>,
        auth: Arc<AuthService>,
        ws_manager: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            quotes,
            transactions,
            auth,
            ws_manager,
        }
    }
}
