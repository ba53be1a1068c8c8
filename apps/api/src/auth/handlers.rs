//! Registration, login and current-user endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::ACCESS_TOKEN_TTL_MINUTES;
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::auth::AuthUser;
use crate::entitlements::tiers::Tier;
use crate::errors::AppError;
use crate::models::user::{UserRow, UserResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 3 {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    validate_password(&req.password)?;
    let full_name = req.full_name.trim().to_string();
    if full_name.len() < 2 {
        return Err(AppError::Validation(
            "Full name must be at least 2 characters long".to_string(),
        ));
    }

    let user_id = Uuid::new_v4();
    let password_hash = hash_password(&req.password)?;

    let row: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, full_name, tier)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(&full_name)
    .bind(Tier::Free.as_str())
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            AppError::Validation("Email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!("Registered user {user_id}");
    token_response(&state, row)
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    let row: Option<UserRow> =
        sqlx::query_as("SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL")
            .bind(&email)
            .fetch_optional(&state.db)
            .await?;

    // Same error for unknown email and wrong password.
    let row = row.ok_or(AppError::Unauthorized)?;
    if !verify_password(&req.password, &row.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    sqlx::query("UPDATE users SET last_login = now(), updated_at = now() WHERE id = $1")
        .bind(row.id)
        .execute(&state.db)
        .await?;

    token_response(&state, row)
}

/// GET /api/v1/auth/me
pub async fn handle_me(user: AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        user_id: user.id,
        email: user.email,
        full_name: user.full_name,
        tier: user.tier.as_str().to_string(),
        is_verified: user.is_verified,
        created_at: user.created_at,
        last_login: user.last_login,
    })
}

fn token_response(state: &AppState, row: UserRow) -> Result<Json<TokenResponse>, AppError> {
    let access_token = state.jwt.sign(row.id)?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: ACCESS_TOKEN_TTL_MINUTES * 60,
        user: row.into(),
    }))
}
