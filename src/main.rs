mod config;
mod error;
mod flow;
mod render;
mod routes;
mod state;
mod store;
mod validate;

use std::sync::Arc;

use config::GuestbookConfig;
use store::memory::MemoryTable;
use store::postgrest::PostgrestTable;
use store::{RemoteTable, SignatureStore, StoreError};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = match GuestbookConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let table = match build_table(&config).await {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(error = %e, "signature store unavailable");
            std::process::exit(1);
        }
    };
    let state = state::AppState::new(SignatureStore::new(table));

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, backend = ?config.backend, "guestbook listening");
    axum::serve(listener, app).await.expect("server failed");
}

async fn build_table(config: &GuestbookConfig) -> Result<Arc<dyn RemoteTable>, StoreError> {
    match &config.remote {
        Some(remote) => {
            let table = PostgrestTable::connect(remote).await?;
            tracing::info!(table = %remote.table, "connected to remote signature table");
            Ok(Arc::new(table))
        }
        None => Ok(Arc::new(MemoryTable::new())),
    }
}
