//! RemitFlow server entry point
//!
//! Wires config, logging, stores, services, and the gateway together.
//! With `database.url` set the Postgres store backs everything; without
//! it the process runs on the in-memory store for local development.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use remitflow::auth::AuthService;
use remitflow::config::AppConfig;
use remitflow::corridor::ReferenceStore;
use remitflow::fees::FeeStore;
use remitflow::gateway::{self, state::AppState};
use remitflow::logging::init_logging;
use remitflow::quote::QuoteService;
use remitflow::rates::RateStore;
use remitflow::store::{MemoryStore, PgStore};
use remitflow::transaction::{TransactionService, TransactionStore};
use remitflow::websocket::ConnectionManager;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    tracing::info!(env = %env, "Starting RemitFlow");

    let (reference_store, rate_store, fee_store, txn_store): (
        Arc<dyn ReferenceStore>,
        Arc<dyn RateStore>,
        Arc<dyn FeeStore>,
        Arc<dyn TransactionStore>,
    ) = match &config.database.url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!("Connected to PostgreSQL");
            let store = Arc::new(PgStore::new(pool));
            (store.clone(), store.clone(), store.clone(), store)
        }
        None => {
            tracing::warn!("No database configured, using in-memory store");
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store.clone(), store.clone(), store)
        }
    };

    let ws_manager = Arc::new(ConnectionManager::new());
    let auth = Arc::new(AuthService::new(
        config.auth.jwt_secret.clone(),
        config.auth.token_ttl_hours,
    ));
    let quotes = Arc::new(QuoteService::new(
        reference_store.clone(),
        rate_store,
        fee_store,
    ));
    let transactions = Arc::new(TransactionService::new(
        txn_store,
        reference_store,
        ws_manager.clone(),
    ));

    let state = Arc::new(AppState::new(quotes, transactions, auth, ws_manager));

    gateway::run_server(config.gateway.port, state).await
}
