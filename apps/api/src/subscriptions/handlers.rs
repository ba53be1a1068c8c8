//! Axum route handlers for tiers, usage reporting and subscriptions.
//!
//! Billing is mocked: tier changes apply immediately with no payment
//! provider behind them. The webhook applies tier updates the way a real
//! payment processor callback would, minus signature validation.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entitlements::tiers::{Access, Tier};
use crate::entitlements::usage::current_month;
use crate::errors::AppError;
use crate::models::usage::UsageRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TierInfo {
    pub tier: Tier,
    pub description: &'static str,
    pub monthly_price_cents: Option<u32>,
    pub features: Vec<FeatureInfo>,
}

#[derive(Debug, Serialize)]
pub struct FeatureInfo {
    pub feature: String,
    /// None means unlimited.
    pub monthly_limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CurrentTierResponse {
    pub tier: Tier,
    pub description: &'static str,
    pub features: Vec<FeatureInfo>,
}

#[derive(Debug, Serialize)]
pub struct UsageEntry {
    pub feature: String,
    pub used: i64,
    /// None means unlimited.
    pub monthly_limit: Option<u32>,
    pub remaining: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub month: String,
    pub tier: Tier,
    pub usage: Vec<UsageEntry>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub status: &'static str,
    pub tier: Tier,
    pub amount_cents: Option<u32>,
    pub currency: Option<&'static str>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeTierRequest {
    pub new_tier: Tier,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event_type: String,
    pub user_id: Uuid,
    pub tier: Tier,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/tiers (public)
pub async fn handle_list_tiers(State(state): State<AppState>) -> Json<Vec<TierInfo>> {
    let tiers = state
        .tiers
        .iter()
        .map(|(tier, def)| TierInfo {
            tier,
            description: def.description,
            monthly_price_cents: def.monthly_price_cents,
            features: feature_infos(def),
        })
        .collect();
    Json(tiers)
}

/// GET /api/v1/user/tier
pub async fn handle_current_tier(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CurrentTierResponse>, AppError> {
    let def = state.tiers.definition(user.tier)?;
    Ok(Json(CurrentTierResponse {
        tier: user.tier,
        description: def.description,
        features: feature_infos(def),
    }))
}

/// GET /api/v1/user/usage
///
/// Current-month usage for every feature in the user's tier, including
/// features never used this month (reported as 0).
pub async fn handle_current_usage(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UsageResponse>, AppError> {
    let month = current_month();
    let def = state.tiers.definition(user.tier)?;

    let rows: Vec<UsageRow> = sqlx::query_as(
        "SELECT user_id, feature, month, count FROM usage_tracking
         WHERE user_id = $1 AND month = $2",
    )
    .bind(user.id)
    .bind(&month)
    .fetch_all(&state.db)
    .await?;

    let usage = def
        .features()
        .map(|feature| {
            let used = rows
                .iter()
                .find(|r| r.feature == feature.as_str())
                .map_or(0, |r| r.count);
            let monthly_limit = match def.access(feature) {
                Access::Limited(cap) => Some(cap),
                _ => None,
            };
            UsageEntry {
                feature: feature.as_str().to_string(),
                used,
                monthly_limit,
                remaining: monthly_limit.map(|cap| (i64::from(cap) - used).max(0)),
            }
        })
        .collect();

    Ok(Json(UsageResponse {
        month,
        tier: user.tier,
        usage,
    }))
}

/// GET /api/v1/subscriptions/current
pub async fn handle_current_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let def = state.tiers.definition(user.tier)?;
    let paid = user.tier != Tier::Free;
    let now = Utc::now();

    Ok(Json(SubscriptionResponse {
        status: if paid { "active" } else { "inactive" },
        tier: user.tier,
        amount_cents: def.monthly_price_cents,
        currency: paid.then_some("usd"),
        current_period_start: paid.then_some(now),
        current_period_end: paid.then(|| now + Duration::days(30)),
    }))
}

/// POST /api/v1/subscriptions/change-tier
pub async fn handle_change_tier(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChangeTierRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.new_tier == user.tier {
        return Err(AppError::Validation("Already on this tier".to_string()));
    }

    state.store.set_tier(user.id, req.new_tier).await?;
    info!(user_id = %user.id, from = %user.tier, to = %req.new_tier, "tier changed");

    Ok(Json(json!({
        "message": format!("Subscription changed from {} to {}", user.tier, req.new_tier),
        "tier": req.new_tier,
    })))
}

/// POST /api/v1/subscriptions/cancel
pub async fn handle_cancel(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    if user.tier == Tier::Free {
        return Err(AppError::Validation(
            "No active subscription to cancel".to_string(),
        ));
    }

    state.store.set_tier(user.id, Tier::Free).await?;
    info!(user_id = %user.id, from = %user.tier, "subscription canceled");

    Ok(Json(json!({
        "message": format!("{} subscription canceled", user.tier),
        "tier": Tier::Free,
    })))
}

/// POST /api/v1/subscriptions/webhook
///
/// Unauthenticated by design; a payment processor posts here. Unknown event
/// types are acknowledged and ignored so the provider does not retry them.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    match event.event_type.as_str() {
        "subscription.updated" | "subscription.created" => {
            state.store.set_tier(event.user_id, event.tier).await?;
            info!(user_id = %event.user_id, tier = %event.tier, "webhook applied tier");
            Ok(Json(json!({ "status": "processed" })))
        }
        "subscription.deleted" => {
            state.store.set_tier(event.user_id, Tier::Free).await?;
            info!(user_id = %event.user_id, "webhook downgraded to free");
            Ok(Json(json!({ "status": "processed" })))
        }
        other => {
            info!(event_type = other, "ignoring unhandled webhook event");
            Ok(Json(json!({ "status": "ignored" })))
        }
    }
}

fn feature_infos(def: &crate::entitlements::tiers::TierDefinition) -> Vec<FeatureInfo> {
    def.features()
        .map(|feature| FeatureInfo {
            feature: feature.as_str().to_string(),
            monthly_limit: match def.access(feature) {
                Access::Limited(cap) => Some(cap),
                _ => None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_event_deserializes() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"event_type": "subscription.updated",
                "user_id": "7f8b1c1e-32a1-4f0b-9a93-0d2f4c7f1a11",
                "tier": "premium"}"#,
        )
        .unwrap();
        assert_eq!(event.tier, Tier::Premium);
        assert_eq!(event.event_type, "subscription.updated");
    }

    #[test]
    fn invalid_tier_in_webhook_is_rejected_at_parse_time() {
        let result = serde_json::from_str::<WebhookEvent>(
            r#"{"event_type": "subscription.updated",
                "user_id": "7f8b1c1e-32a1-4f0b-9a93-0d2f4c7f1a11",
                "tier": "platinum"}"#,
        );
        assert!(result.is_err());
    }
}
