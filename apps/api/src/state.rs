use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::Jwt;
use crate::config::Config;
use crate::documents::DocumentRegistry;
use crate::entitlements::gate::EntitlementGate;
use crate::entitlements::store::EntitlementStore;
use crate::entitlements::tiers::TierCatalog;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    pub jwt: Jwt,
    /// Every feature endpoint goes through the gate; handlers never check
    /// tiers or counters themselves.
    pub gate: EntitlementGate,
    pub store: Arc<dyn EntitlementStore>,
    pub tiers: Arc<TierCatalog>,
    pub documents: DocumentRegistry,
}
