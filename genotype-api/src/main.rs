use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

use crate::app_state::AppState;
use crate::domain::search::store::PgDocumentStore;
use crate::domain::search::{Projector, Schema, SearchService};

mod app_state;
mod config;
mod domain;
mod router;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = config::read_config().context("Failed to read configuration")?;
    let search_config = settings.genotypes.search_config()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(settings.database.with_db())
        .await
        .context("Failed to connect to Postgres")?;

    let store = PgDocumentStore::new(pool);
    for collection in [
        &search_config.collections.populations,
        &search_config.collections.varieties,
    ] {
        store
            .ensure_collection(collection)
            .await
            .with_context(|| format!("Failed to prepare collection \"{}\"", collection))?;
    }

    let schema = Schema::DEFAULT;
    let projector = Projector::new(schema, settings.genotypes.name_mappings(&schema)?);
    let search_service = SearchService::new(store, projector, search_config);

    let shutdown = CancellationToken::new();
    let app_state = AppState::new(Arc::new(search_service), shutdown.clone());
    let app = router::create(app_state);

    let address = format!("{}:{}", settings.application.host, settings.application.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("shutting down, cancelling in-flight searches");
    shutdown.cancel();
}
