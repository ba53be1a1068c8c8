//! Entitlement store — point lookups and the single tier mutator.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::entitlements::tiers::Tier;
use crate::errors::AppError;

/// Persistent record of each user's subscription tier and admin flag.
///
/// `set_tier` is the only mutator and is idempotent: setting the tier a user
/// already has is a no-op. Carried in `AppState` as `Arc<dyn EntitlementStore>`
/// so the gate can be exercised against an in-memory store in tests.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn tier(&self, user_id: Uuid) -> Result<Tier, AppError>;
    async fn set_tier(&self, user_id: Uuid, tier: Tier) -> Result<(), AppError>;
    async fn is_admin(&self, user_id: Uuid) -> Result<bool, AppError>;
}

pub struct PgEntitlementStore {
    pool: PgPool,
}

impl PgEntitlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntitlementStore for PgEntitlementStore {
    async fn tier(&self, user_id: Uuid) -> Result<Tier, AppError> {
        let tier: Option<String> =
            sqlx::query_scalar("SELECT tier FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let tier = tier.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
        Tier::from_db(&tier)
    }

    async fn set_tier(&self, user_id: Uuid, tier: Tier) -> Result<(), AppError> {
        // The tier read doubles as the existence check; a same-tier write
        // stops here without touching the row (or its updated_at).
        let current = self.tier(user_id).await?;
        if current == tier {
            return Ok(());
        }

        let result = sqlx::query(
            "UPDATE users SET tier = $2, updated_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(tier.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }

        info!("Set tier for user {user_id} to {tier}");
        Ok(())
    }

    async fn is_admin(&self, user_id: Uuid) -> Result<bool, AppError> {
        let is_admin: Option<bool> =
            sqlx::query_scalar("SELECT is_admin FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        is_admin.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }
}
