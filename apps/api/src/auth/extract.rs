//! Axum extractors for authenticated and admin requests.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entitlements::tiers::Tier;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// The authenticated caller, loaded from the Bearer token on every request.
/// Soft-deleted accounts do not authenticate. The tier name is parsed here
/// so a corrupt `users.tier` value fails loudly instead of defaulting.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub tier: Tier,
    pub is_admin: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for AuthUser {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, AppError> {
        Ok(Self {
            id: row.id,
            email: row.email,
            full_name: row.full_name,
            tier: Tier::from_db(&row.tier)?,
            is_admin: row.is_admin,
            is_verified: row.is_verified,
            created_at: row.created_at,
            last_login: row.last_login,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = state.jwt.verify(token)?;

        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(claims.sub)
                .fetch_optional(&state.db)
                .await?;

        row.ok_or(AppError::Unauthorized)
            .and_then(AuthUser::try_from)
    }
}

/// An authenticated caller with the admin capability flag set. The flag is
/// the single source of admin-ness; no email heuristics.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
