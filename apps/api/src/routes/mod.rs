pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, analysis, auth, documents, interview, letters, subscriptions};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handlers::handle_register))
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route("/api/v1/auth/me", get(auth::handlers::handle_me))
        // Tiers and usage
        .route("/api/v1/tiers", get(subscriptions::handlers::handle_list_tiers))
        .route(
            "/api/v1/user/tier",
            get(subscriptions::handlers::handle_current_tier),
        )
        .route(
            "/api/v1/user/usage",
            get(subscriptions::handlers::handle_current_usage),
        )
        // Resumes
        .route(
            "/api/v1/resumes/generate",
            post(analysis::handlers::handle_generate_resume),
        )
        .route(
            "/api/v1/resumes/analyze",
            post(analysis::handlers::handle_analyze_resume),
        )
        .route("/api/v1/ats-check", post(analysis::handlers::handle_ats_check))
        // Cover letters
        .route(
            "/api/v1/cover-letters/generate",
            post(letters::handlers::handle_generate_letter),
        )
        .route(
            "/api/v1/cover-letters/analyze",
            post(letters::handlers::handle_analyze_letter_upload),
        )
        .route(
            "/api/v1/cover-letters/analyze-text",
            post(letters::handlers::handle_analyze_letter_text),
        )
        // Documents
        .route(
            "/api/v1/documents/:id",
            get(documents::handlers::handle_download)
                .delete(documents::handlers::handle_delete),
        )
        // Interview prep
        .route("/api/v1/interview/prep", post(interview::handlers::handle_prep))
        .route(
            "/api/v1/interview/feedback",
            post(interview::handlers::handle_feedback),
        )
        .route(
            "/api/v1/interview/research",
            post(interview::handlers::handle_research),
        )
        // Subscriptions
        .route(
            "/api/v1/subscriptions/current",
            get(subscriptions::handlers::handle_current_subscription),
        )
        .route(
            "/api/v1/subscriptions/change-tier",
            post(subscriptions::handlers::handle_change_tier),
        )
        .route(
            "/api/v1/subscriptions/cancel",
            post(subscriptions::handlers::handle_cancel),
        )
        .route(
            "/api/v1/subscriptions/webhook",
            post(subscriptions::handlers::handle_webhook),
        )
        // Admin
        .route("/api/v1/admin/stats", get(admin::handlers::handle_stats))
        .route("/api/v1/admin/users", get(admin::handlers::handle_list_users))
        .route(
            "/api/v1/admin/users/:id",
            get(admin::handlers::handle_get_user)
                .put(admin::handlers::handle_update_user)
                .delete(admin::handlers::handle_delete_user),
        )
        .route(
            "/api/v1/admin/users/:id/tier",
            post(admin::handlers::handle_change_user_tier),
        )
        .with_state(state)
}
