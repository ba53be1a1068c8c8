//! Download and delete endpoints for issued documents.
//!
//! The download is where quota is charged: the gate is consulted before the
//! registry lookup and settled only after the document is in hand, so a
//! missing or expired document never costs a download slot.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entitlements::tiers::Feature;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/documents/:id
pub async fn handle_download(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.gate.admit(user.id, Feature::PdfDownload).await?;

    let doc = state.documents.fetch(id, user.id)?;

    state.gate.settle(user.id, Feature::PdfDownload).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&doc.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    let disposition = format!("attachment; filename=\"{}\"", doc.filename);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    Ok((headers, doc.payload))
}

/// DELETE /api/v1/documents/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.documents.delete(id, user.id)?;
    Ok(StatusCode::NO_CONTENT)
}
