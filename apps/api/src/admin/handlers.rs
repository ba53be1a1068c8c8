//! Axum route handlers for the admin surface. Every handler takes
//! `AdminUser`, so non-admin callers are rejected before any query runs.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::entitlements::tiers::Tier;
use crate::errors::AppError;
use crate::models::usage::UsageRow;
use crate::models::user::{UserResponse, UserRow};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlatformStats {
    pub total_users: i64,
    pub free_users: i64,
    pub premium_users: i64,
    pub professional_users: i64,
    pub verified_users: i64,
    pub active_last_30_days: i64,
    pub signups_this_month: i64,
    pub estimated_monthly_revenue_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Substring match against email and full name.
    pub search: Option<String>,
    pub tier: Option<Tier>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub user: UserResponse,
    pub is_admin: bool,
    pub usage_history: Vec<UsageRow>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub tier: Option<Tier>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeUserTierRequest {
    pub tier: Tier,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<PlatformStats>, AppError> {
    let (total, free, premium, professional, verified, active, signups): (
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            count(*),
            count(*) FILTER (WHERE tier = 'free'),
            count(*) FILTER (WHERE tier = 'premium'),
            count(*) FILTER (WHERE tier = 'professional'),
            count(*) FILTER (WHERE is_verified),
            count(*) FILTER (WHERE last_login > now() - interval '30 days'),
            count(*) FILTER (WHERE created_at > date_trunc('month', now()))
        FROM users
        WHERE deleted_at IS NULL
        "#,
    )
    .fetch_one(&state.db)
    .await?;

    let revenue = state
        .tiers
        .iter()
        .map(|(tier, def)| {
            let subscribers = match tier {
                Tier::Free => 0,
                Tier::Premium => premium,
                Tier::Professional => professional,
            };
            i64::from(def.monthly_price_cents.unwrap_or(0)) * subscribers
        })
        .sum();

    Ok(Json(PlatformStats {
        total_users: total,
        free_users: free,
        premium_users: premium,
        professional_users: professional,
        verified_users: verified,
        active_last_30_days: active,
        signups_this_month: signups,
        estimated_monthly_revenue_cents: revenue,
    }))
}

/// GET /api/v1/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut count_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT count(*) FROM users WHERE deleted_at IS NULL");
    let mut list_query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM users WHERE deleted_at IS NULL");

    for query in [&mut count_query, &mut list_query] {
        if let Some(search) = params.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query
                .push(" AND (email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR full_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(tier) = params.tier {
            query.push(" AND tier = ").push_bind(tier.as_str());
        }
    }

    let total: i64 = count_query.build_query_scalar().fetch_one(&state.db).await?;

    list_query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(per_page)
        .push(" OFFSET ")
        .push_bind((page - 1) * per_page);

    let rows: Vec<UserRow> = list_query.build_query_as().fetch_all(&state.db).await?;

    Ok(Json(UserListResponse {
        users: rows.into_iter().map(UserResponse::from).collect(),
        total,
        page,
        per_page,
    }))
}

/// GET /api/v1/admin/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDetailResponse>, AppError> {
    let row = fetch_user(&state, user_id).await?;

    let usage_history: Vec<UsageRow> = sqlx::query_as(
        "SELECT user_id, feature, month, count FROM usage_tracking
         WHERE user_id = $1 ORDER BY month DESC, feature",
    )
    .bind(user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(UserDetailResponse {
        is_admin: row.is_admin,
        user: row.into(),
        usage_history,
    }))
}

/// PUT /api/v1/admin/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if let Some(name) = req.full_name.as_deref() {
        if name.trim().len() < 2 {
            return Err(AppError::Validation(
                "Full name must be at least 2 characters long".to_string(),
            ));
        }
    }

    let row: Option<UserRow> = sqlx::query_as(
        r#"
        UPDATE users
        SET full_name   = coalesce($2, full_name),
            tier        = coalesce($3, tier),
            is_verified = coalesce($4, is_verified),
            updated_at  = now()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(req.full_name.as_deref().map(str::trim))
    .bind(req.tier.map(Tier::as_str))
    .bind(req.is_verified)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    info!(user_id = %user_id, "admin updated user");
    Ok(Json(row.into()))
}

/// DELETE /api/v1/admin/users/:id
///
/// Soft delete. The row stays behind for audit; the account can no longer
/// authenticate.
pub async fn handle_delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if admin.0.id == user_id {
        return Err(AppError::Validation(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    let result = sqlx::query(
        "UPDATE users SET deleted_at = now(), updated_at = now()
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(user_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }

    info!(user_id = %user_id, admin_id = %admin.0.id, "admin soft-deleted user");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/:id/tier
pub async fn handle_change_user_tier(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ChangeUserTierRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let old_tier = state.store.tier(user_id).await?;
    state.store.set_tier(user_id, req.tier).await?;

    info!(
        user_id = %user_id,
        admin_id = %admin.0.id,
        from = %old_tier,
        to = %req.tier,
        "admin changed user tier"
    );

    Ok(Json(json!({
        "user_id": user_id,
        "old_tier": old_tier,
        "new_tier": req.tier,
    })))
}

async fn fetch_user(state: &AppState, user_id: Uuid) -> Result<UserRow, AppError> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?;
    row.ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_are_clamped() {
        let params = ListUsersParams {
            page: Some(-5),
            per_page: Some(10_000),
            search: None,
            tier: None,
        };
        assert_eq!(params.page.unwrap_or(1).max(1), 1);
        assert_eq!(
            params
                .per_page
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            MAX_PAGE_SIZE
        );
    }

    #[test]
    fn update_request_allows_partial_bodies() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"tier": "premium"}"#).unwrap();
        assert_eq!(req.tier, Some(Tier::Premium));
        assert!(req.full_name.is_none());
        assert!(req.is_verified.is_none());
    }
}
