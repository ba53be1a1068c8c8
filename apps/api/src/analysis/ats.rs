//! ATS keyword matching — pure, deterministic, no LLM call.
//!
//! Scores a resume against a job description by vocabulary overlap: the
//! share of distinct job-description words that also appear in the resume.

use std::collections::BTreeSet;

use serde::Serialize;

/// Words too common to signal anything about fit.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "of", "on", "or",
    "our", "the", "to", "with", "we", "you", "your", "will", "have", "has",
];

#[derive(Debug, Clone, Serialize)]
pub struct AtsReport {
    /// 0.0 – 100.0, rounded to two decimals.
    pub match_percentage: f64,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
}

/// Tokenizes into lowercase alphanumeric words, dropping stopwords and
/// single characters.
fn keywords(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1 && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

pub fn score(resume_text: &str, job_description: &str) -> AtsReport {
    let resume_words = keywords(resume_text);
    let job_words = keywords(job_description);

    if job_words.is_empty() {
        return AtsReport {
            match_percentage: 0.0,
            matched_keywords: vec![],
            missing_keywords: vec![],
        };
    }

    let matched: Vec<String> = job_words.intersection(&resume_words).cloned().collect();
    let missing: Vec<String> = job_words.difference(&resume_words).cloned().collect();

    let ratio = matched.len() as f64 / job_words.len() as f64;
    let match_percentage = (ratio * 10_000.0).round() / 100.0;

    AtsReport {
        match_percentage,
        matched_keywords: matched,
        missing_keywords: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_overlap_scores_100() {
        let report = score("rust engineer postgres", "Rust engineer PostGres");
        assert_eq!(report.match_percentage, 100.0);
        assert!(report.missing_keywords.is_empty());
    }

    #[test]
    fn no_overlap_scores_0() {
        let report = score("gardening and pottery", "kernel development");
        assert_eq!(report.match_percentage, 0.0);
        assert_eq!(report.matched_keywords.len(), 0);
    }

    #[test]
    fn partial_overlap_is_proportional() {
        // Job keywords: {rust, tokio, axum, postgres}; resume covers two.
        let report = score("I know rust and postgres", "rust tokio axum postgres");
        assert_eq!(report.match_percentage, 50.0);
        assert_eq!(report.matched_keywords, vec!["postgres", "rust"]);
        assert_eq!(report.missing_keywords, vec!["axum", "tokio"]);
    }

    #[test]
    fn stopwords_and_case_are_ignored() {
        let report = score("THE RUST", "the a an rust");
        assert_eq!(report.match_percentage, 100.0);
    }

    #[test]
    fn empty_job_description_scores_0() {
        let report = score("anything", "");
        assert_eq!(report.match_percentage, 0.0);
    }
}
