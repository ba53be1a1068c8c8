//! Axum route handlers for resume analysis, generation and ATS checks.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::analysis::ats::{self, AtsReport};
use crate::analysis::extract_text::extract_text;
use crate::analysis::prompts;
use crate::auth::AuthUser;
use crate::entitlements::tiers::Feature;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    pub missing_keywords: Vec<String>,
    pub present_keywords: Vec<String>,
    pub suggestions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeAnalysisReport {
    pub overall_score: u32,
    pub ats_score: u32,
    pub formatting_score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub specific_improvements: Vec<String>,
    pub ats_recommendations: Vec<String>,
    pub keyword_analysis: KeywordAnalysis,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResumeResponse {
    pub analysis: ResumeAnalysisReport,
    pub original_length: usize,
    pub target_role: Option<String>,
    pub ai_powered: bool,
}

#[derive(Debug, Deserialize)]
pub struct AtsCheckRequest {
    pub resume_text: String,
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResumeRequest {
    pub contact_info: Option<String>,
    pub work_history: String,
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResumeResponse {
    pub resume_text: String,
    pub document_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub ai_powered: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/analyze (multipart: file, target_role?)
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResumeResponse>, AppError> {
    state.gate.admit(user.id, Feature::ResumeAnalysis).await?;

    let mut file: Option<(String, Bytes)> = None;
    let mut target_role: Option<String> = None;

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
            Some("target_role") => {
                target_role = field.text().await.ok().filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let (content_type, data) =
        file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    let resume_text = extract_text(&content_type, &data)?;

    let analysis = analyze_resume(&state, &resume_text, target_role.as_deref()).await;

    state.gate.settle(user.id, Feature::ResumeAnalysis).await?;

    Ok(Json(AnalyzeResumeResponse {
        analysis,
        original_length: resume_text.len(),
        target_role,
        ai_powered: state.llm.is_enabled(),
    }))
}

/// POST /api/v1/ats-check
pub async fn handle_ats_check(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AtsCheckRequest>,
) -> Result<Json<AtsReport>, AppError> {
    state.gate.admit(user.id, Feature::AtsScoring).await?;

    if req.resume_text.trim().is_empty() || req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text and job_description cannot be empty".to_string(),
        ));
    }

    let report = ats::score(&req.resume_text, &req.job_description);

    state.gate.settle(user.id, Feature::AtsScoring).await?;
    Ok(Json(report))
}

/// POST /api/v1/resumes/generate
///
/// Generates resume text and issues it as a downloadable document. The
/// issued document does NOT touch the pdf_download quota — only the actual
/// download does.
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateResumeRequest>,
) -> Result<Json<GenerateResumeResponse>, AppError> {
    state.gate.admit(user.id, Feature::ResumeBuilder).await?;

    if req.work_history.trim().is_empty() || req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "work_history and job_description cannot be empty".to_string(),
        ));
    }

    let prompt = prompts::generation_prompt(
        &user.full_name,
        req.contact_info.as_deref(),
        &req.work_history,
        &req.job_description,
    );

    let resume_text = match state
        .llm
        .call_text(prompts::WRITER_SYSTEM, &prompt, 0.7, 1200)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!("Resume generation via LLM failed, using template: {e}");
            template_resume(&user.full_name, req.contact_info.as_deref(), &req.work_history)
        }
    };

    let doc = state.documents.issue(
        user.id,
        Bytes::from(resume_text.clone().into_bytes()),
        "text/plain; charset=utf-8",
        "resume.txt",
    );

    state.gate.settle(user.id, Feature::ResumeBuilder).await?;

    Ok(Json(GenerateResumeResponse {
        resume_text,
        document_id: doc.id,
        expires_at: doc.expires_at,
        ai_powered: state.llm.is_enabled(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis core with deterministic fallback
// ────────────────────────────────────────────────────────────────────────────

async fn analyze_resume(
    state: &AppState,
    resume_text: &str,
    target_role: Option<&str>,
) -> ResumeAnalysisReport {
    let prompt = prompts::analysis_prompt(resume_text, target_role);
    match state
        .llm
        .call_json::<ResumeAnalysisReport>(prompts::ANALYST_SYSTEM, &prompt, 2000)
        .await
    {
        Ok(report) => report,
        Err(e) => {
            warn!("Resume analysis via LLM failed, using heuristic fallback: {e}");
            heuristic_resume_analysis(resume_text, target_role)
        }
    }
}

/// Deterministic analysis used when the LLM is unavailable. Scores from
/// observable structural signals instead of guessing.
pub fn heuristic_resume_analysis(
    resume_text: &str,
    target_role: Option<&str>,
) -> ResumeAnalysisReport {
    let lower = resume_text.to_lowercase();

    let has_contact = lower.contains('@') || lower.contains("phone");
    let has_experience = lower.contains("experience") || lower.contains("worked");
    let has_education = lower.contains("education") || lower.contains("degree");
    let has_skills = lower.contains("skills");
    let has_numbers = resume_text.chars().any(|c| c.is_ascii_digit());
    let mentions_role = target_role.is_some_and(|r| lower.contains(&r.to_lowercase()));

    let indicators = [
        has_contact,
        has_experience,
        has_education,
        has_skills,
        has_numbers,
        mentions_role,
    ];
    let quality = indicators.iter().filter(|b| **b).count() as u32;
    let overall_score = (55 + quality * 7).min(95);

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut improvements = Vec::new();

    if has_contact {
        strengths.push("Clear contact information".to_string());
    } else {
        weaknesses.push("Missing contact information".to_string());
        improvements.push("Add email and phone number at the top".to_string());
    }
    if has_experience {
        strengths.push("Professional experience documented".to_string());
    } else {
        weaknesses.push("No clearly marked experience section".to_string());
        improvements.push("Add an Experience section with dated roles".to_string());
    }
    if has_numbers {
        strengths.push("Includes quantified details".to_string());
    } else {
        weaknesses.push("Lacks quantified achievements".to_string());
        improvements
            .push("Add specific numbers and percentages to your achievements".to_string());
    }
    if let Some(role) = target_role {
        if !mentions_role {
            improvements.push(format!("Optimize for {role} keywords"));
        }
    }
    if strengths.is_empty() {
        strengths.push("Document submitted for review".to_string());
    }
    if weaknesses.is_empty() {
        weaknesses.push("Could add more role-specific keywords".to_string());
    }
    if improvements.is_empty() {
        improvements.push("Use stronger action verbs (achieved, implemented, optimized)".to_string());
    }

    ResumeAnalysisReport {
        overall_score,
        ats_score: overall_score.saturating_sub(if has_numbers { 0 } else { 10 }),
        formatting_score: overall_score.saturating_sub(5),
        strengths,
        weaknesses,
        specific_improvements: improvements,
        ats_recommendations: vec![
            "Use standard section headers (Experience, Education, Skills)".to_string(),
            "Maintain consistent formatting throughout".to_string(),
            "Include relevant keywords naturally in content".to_string(),
        ],
        keyword_analysis: KeywordAnalysis {
            missing_keywords: vec![
                "leadership".to_string(),
                "results-driven".to_string(),
                "collaborative".to_string(),
            ],
            present_keywords: ["experience", "skills", "education"]
                .iter()
                .filter(|k| lower.contains(*k))
                .map(|k| (*k).to_string())
                .collect(),
            suggestions: "Incorporate more keywords from the target job posting".to_string(),
        },
    }
}

fn template_resume(full_name: &str, contact_info: Option<&str>, work_history: &str) -> String {
    format!(
        "{full_name}\n{}\n\nPROFESSIONAL SUMMARY\nResults-driven professional with proven \
experience in delivering exceptional outcomes.\n\nEXPERIENCE\n{work_history}\n\nSKILLS\n\
• Leadership, communication, problem-solving\n• Relevant technical and industry knowledge\n",
        contact_info.unwrap_or("[Email] | [Phone] | [Location]")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_rewards_structure() {
        let strong = heuristic_resume_analysis(
            "jane@example.com, 5 years experience, education: BSc, skills: rust",
            Some("rust"),
        );
        let weak = heuristic_resume_analysis("some unstructured words", None);
        assert!(strong.overall_score > weak.overall_score);
        assert!(strong.strengths.iter().any(|s| s.contains("quantified")));
    }

    #[test]
    fn heuristic_scores_stay_in_range() {
        let report = heuristic_resume_analysis("", None);
        assert!(report.overall_score >= 55);
        assert!(report.overall_score <= 95);
        assert!(!report.weaknesses.is_empty());
    }

    #[test]
    fn missing_role_mention_suggests_keyword_optimization() {
        let report = heuristic_resume_analysis(
            "jane@example.com experienced engineer with many skills and education",
            Some("astronaut"),
        );
        assert!(report
            .specific_improvements
            .iter()
            .any(|s| s.contains("astronaut")));
    }
}
