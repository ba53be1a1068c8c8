mod admin;
mod analysis;
mod auth;
mod config;
mod db;
mod documents;
mod entitlements;
mod errors;
mod interview;
mod letters;
mod llm_client;
mod models;
mod routes;
mod state;
mod subscriptions;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::Jwt;
use crate::config::Config;
use crate::db::create_pool;
use crate::documents::DocumentRegistry;
use crate::entitlements::gate::EntitlementGate;
use crate::entitlements::store::PgEntitlementStore;
use crate::entitlements::tiers::TierCatalog;
use crate::entitlements::usage::PgUsageTracker;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hire Ready API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone())?;
    if llm.is_enabled() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        info!("No OPENAI_API_KEY set; AI endpoints will use deterministic fallbacks");
    }

    // Token signing
    let jwt = Jwt::new(&config.jwt_secret)?;

    // Entitlement machinery: tier catalog, store and usage tracker feed one
    // shared gate.
    let tiers = Arc::new(TierCatalog::default());
    let store = Arc::new(PgEntitlementStore::new(db.clone()));
    let usage = Arc::new(PgUsageTracker::new(db.clone()));
    let gate = EntitlementGate::new(store.clone(), usage, tiers.clone());

    // In-process registry for generated documents (24h TTL)
    let documents = DocumentRegistry::new();

    let state = AppState {
        db,
        llm,
        config: config.clone(),
        jwt,
        gate,
        store,
        tiers,
        documents,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
