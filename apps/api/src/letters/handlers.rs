//! Axum route handlers for cover letter generation and analysis.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::analysis::extract_text::extract_text;
use crate::auth::AuthUser;
use crate::entitlements::tiers::Feature;
use crate::errors::AppError;
use crate::letters::heuristics::{self, CoverLetterAnalysis};
use crate::letters::prompts;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Enthusiastic,
    Formal,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Formal => "formal",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateLetterRequest {
    pub job_posting: String,
    #[serde(default)]
    pub tone: Tone,
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateLetterResponse {
    pub cover_letter: String,
    pub analysis: CoverLetterAnalysis,
    pub document_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub ai_powered: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeLetterTextRequest {
    pub cover_letter: String,
    pub job_posting: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeLetterResponse {
    pub analysis: CoverLetterAnalysis,
    pub word_count: usize,
    pub ai_powered: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cover-letters/generate
pub async fn handle_generate_letter(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateLetterRequest>,
) -> Result<Json<GenerateLetterResponse>, AppError> {
    state
        .gate
        .admit(user.id, Feature::CoverLetterGeneration)
        .await?;

    if req.job_posting.trim().is_empty() {
        return Err(AppError::Validation(
            "job_posting cannot be empty".to_string(),
        ));
    }

    let prompt = prompts::generation_prompt(
        &user.full_name,
        &req.job_posting,
        req.tone.as_str(),
        req.resume_text.as_deref(),
    );

    let cover_letter = match state
        .llm
        .call_text(prompts::WRITER_SYSTEM, &prompt, 0.7, 900)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!("Cover letter generation via LLM failed, using template: {e}");
            heuristics::template_letter(&user.full_name, &req.job_posting, req.tone)
        }
    };

    // Heuristic scoring of the fresh letter avoids a second LLM round trip.
    let analysis = heuristics::analyze(&cover_letter, Some(&req.job_posting));

    let doc = state.documents.issue(
        user.id,
        Bytes::from(cover_letter.clone().into_bytes()),
        "text/plain; charset=utf-8",
        "cover_letter.txt",
    );

    state
        .gate
        .settle(user.id, Feature::CoverLetterGeneration)
        .await?;

    Ok(Json(GenerateLetterResponse {
        cover_letter,
        analysis,
        document_id: doc.id,
        expires_at: doc.expires_at,
        ai_powered: state.llm.is_enabled(),
    }))
}

/// POST /api/v1/cover-letters/analyze (multipart: file, job_posting?)
pub async fn handle_analyze_letter_upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeLetterResponse>, AppError> {
    state
        .gate
        .admit(user.id, Feature::CoverLetterAnalysis)
        .await?;

    let mut file: Option<(String, Bytes)> = None;
    let mut job_posting: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
                file = Some((content_type, data));
            }
            Some("job_posting") => {
                job_posting = field.text().await.ok().filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let (content_type, data) =
        file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    let letter = extract_text(&content_type, &data)?;

    let analysis = analyze_letter(&state, &letter, job_posting.as_deref()).await;
    let word_count = letter.split_whitespace().count();

    state
        .gate
        .settle(user.id, Feature::CoverLetterAnalysis)
        .await?;

    Ok(Json(AnalyzeLetterResponse {
        analysis,
        word_count,
        ai_powered: state.llm.is_enabled(),
    }))
}

/// POST /api/v1/cover-letters/analyze-text
pub async fn handle_analyze_letter_text(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AnalyzeLetterTextRequest>,
) -> Result<Json<AnalyzeLetterResponse>, AppError> {
    state
        .gate
        .admit(user.id, Feature::CoverLetterAnalysis)
        .await?;

    if req.cover_letter.trim().len() < crate::analysis::extract_text::MIN_DOCUMENT_CHARS {
        return Err(AppError::Validation(
            "Cover letter is too short to analyze".to_string(),
        ));
    }

    let analysis = analyze_letter(&state, &req.cover_letter, req.job_posting.as_deref()).await;
    let word_count = req.cover_letter.split_whitespace().count();

    state
        .gate
        .settle(user.id, Feature::CoverLetterAnalysis)
        .await?;

    Ok(Json(AnalyzeLetterResponse {
        analysis,
        word_count,
        ai_powered: state.llm.is_enabled(),
    }))
}

async fn analyze_letter(
    state: &AppState,
    letter: &str,
    job_posting: Option<&str>,
) -> CoverLetterAnalysis {
    let prompt = prompts::analysis_prompt(letter, job_posting);
    match state
        .llm
        .call_json::<CoverLetterAnalysis>(prompts::ANALYST_SYSTEM, &prompt, 1500)
        .await
    {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Cover letter analysis via LLM failed, using heuristic fallback: {e}");
            heuristics::analyze(letter, job_posting)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_deserializes_from_lowercase() {
        let tone: Tone = serde_json::from_str("\"enthusiastic\"").unwrap();
        assert_eq!(tone, Tone::Enthusiastic);
    }

    #[test]
    fn tone_defaults_to_professional() {
        let req: GenerateLetterRequest =
            serde_json::from_str(r#"{"job_posting": "Engineer wanted"}"#).unwrap();
        assert_eq!(req.tone, Tone::Professional);
        assert!(req.resume_text.is_none());
    }
}
