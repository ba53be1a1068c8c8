use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The two entitlement denials are deliberately distinct: `LimitExceeded`
/// (quota reached, recoverable by upgrading or waiting for next month) and
/// `UpgradeRequired` (feature not in the user's tier at all). Neither is ever
/// collapsed into a generic failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Monthly limit of {limit} reached for {feature} on the {tier} tier")]
    LimitExceeded {
        feature: String,
        limit: u32,
        tier: String,
    },

    #[error("Feature '{feature}' requires the {required_tier} tier")]
    UpgradeRequired {
        feature: String,
        current_tier: String,
        required_tier: String,
    },

    /// A tier name that does not exist in the tier catalog. Configuration
    /// bug: fatal to the request, never silently defaulted.
    #[error("Unknown tier: {0}")]
    InvalidTier(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match &self {
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", json!({ "message": msg }))
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                json!({ "message": msg }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                json!({ "message": "Authentication required" }),
            ),
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", json!({ "message": msg }))
            }
            AppError::LimitExceeded {
                feature,
                limit,
                tier,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "TIER_LIMIT_EXCEEDED",
                json!({
                    "message": self.to_string(),
                    "feature": feature,
                    "limit": limit,
                    "tier": tier,
                    "upgrade_url": "/pricing",
                }),
            ),
            AppError::UpgradeRequired {
                feature,
                current_tier,
                required_tier,
            } => (
                StatusCode::FORBIDDEN,
                "UPGRADE_REQUIRED",
                json!({
                    "message": self.to_string(),
                    "feature": feature,
                    "current_tier": current_tier,
                    "required_tier": required_tier,
                    "upgrade_url": "/pricing",
                }),
            ),
            AppError::InvalidTier(tier) => {
                tracing::error!("Tier '{tier}' is missing from the tier catalog");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    json!({ "message": "An internal server error occurred" }),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    json!({ "message": "A database error occurred" }),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    json!({ "message": "An AI processing error occurred" }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    json!({ "message": "An internal server error occurred" }),
                )
            }
        };

        let mut error: Value = json!({ "code": code });
        if let (Some(obj), Some(extra)) = (error.as_object_mut(), detail.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
