//! Deterministic cover letter scoring and templating.
//!
//! These are the fallback paths used whenever the LLM is disabled or fails;
//! they also score freshly generated letters without a second LLM round trip.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverLetterAnalysis {
    pub overall_score: u32,
    pub tone_score: u32,
    pub relevance_score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvements: Vec<String>,
}

/// Scores a letter from structural quality indicators.
///
/// Base of 60, plus 3 per indicator hit, nudged by length, capped at 95 so
/// a heuristic never claims perfection.
pub fn analyze(letter: &str, job_posting: Option<&str>) -> CoverLetterAnalysis {
    let lower = letter.to_lowercase();
    let word_count = letter.split_whitespace().count();

    let has_greeting = lower.contains("dear") || lower.starts_with("hello");
    let has_role_mention = job_posting
        .and_then(super::posting::extract_role)
        .is_some_and(|r| lower.contains(&r.to_lowercase()));
    let has_company_mention = job_posting
        .and_then(super::posting::extract_company)
        .is_some_and(|c| lower.contains(&c.to_lowercase()));
    let has_experience = lower.contains("experience") || lower.contains("worked");
    let has_achievements = lower.contains("achieved")
        || lower.contains("led")
        || lower.contains("improved")
        || lower.contains("delivered");
    let has_closing = lower.contains("sincerely")
        || lower.contains("regards")
        || lower.contains("thank you");
    let has_numbers = letter.chars().any(|c| c.is_ascii_digit());
    let avoids_generic =
        !lower.contains("to whom it may concern") && !lower.contains("dear sir or madam");

    let indicators = [
        has_greeting,
        has_role_mention,
        has_company_mention,
        has_experience,
        has_achievements,
        has_closing,
        has_numbers,
        avoids_generic,
    ];
    let quality = indicators.iter().filter(|b| **b).count() as i32;

    let length_adjustment: i32 = match word_count {
        0..=99 => -10,
        100..=400 => 5,
        _ => -5,
    };

    let overall_score = (60 + quality * 3 + length_adjustment).clamp(0, 95) as u32;

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut improvements = Vec::new();

    if has_greeting {
        strengths.push("Opens with a proper greeting".to_string());
    } else {
        weaknesses.push("Missing a greeting".to_string());
        improvements.push("Open with a personalized greeting".to_string());
    }
    if has_company_mention {
        strengths.push("References the hiring company by name".to_string());
    } else {
        improvements.push("Mention the company by name to show genuine interest".to_string());
    }
    if has_achievements {
        strengths.push("Highlights concrete achievements".to_string());
    } else {
        weaknesses.push("Light on concrete achievements".to_string());
        improvements.push("Describe specific accomplishments with measurable impact".to_string());
    }
    if has_numbers {
        strengths.push("Quantifies impact with numbers".to_string());
    } else {
        improvements.push("Add numbers or percentages to quantify your impact".to_string());
    }
    if !has_closing {
        weaknesses.push("Missing a professional closing".to_string());
        improvements.push("Close with a call to action and a sign-off".to_string());
    }
    if !avoids_generic {
        weaknesses.push("Uses a generic salutation".to_string());
        improvements.push("Address a specific person or team instead of a generic salutation"
            .to_string());
    }
    if word_count < 100 {
        weaknesses.push("Letter is too short to make a case".to_string());
    } else if word_count > 400 {
        weaknesses.push("Letter runs long; hiring managers skim".to_string());
        improvements.push("Trim to under 400 words".to_string());
    }
    if strengths.is_empty() {
        strengths.push("Letter submitted for review".to_string());
    }
    if improvements.is_empty() {
        improvements.push("Tailor each paragraph to the specific role".to_string());
    }

    CoverLetterAnalysis {
        overall_score,
        tone_score: (overall_score + u32::from(has_greeting && has_closing) * 5).min(95),
        relevance_score: if has_role_mention || has_company_mention {
            overall_score.min(95)
        } else {
            overall_score.saturating_sub(10)
        },
        strengths,
        weaknesses,
        improvements,
    }
}

/// Fills out a conventional three-paragraph letter when the LLM cannot.
pub fn template_letter(full_name: &str, job_posting: &str, tone: super::handlers::Tone) -> String {
    let role = super::posting::extract_role(job_posting)
        .unwrap_or_else(|| "this position".to_string());
    let company = super::posting::extract_company(job_posting)
        .unwrap_or_else(|| "your organization".to_string());

    let opener = match tone {
        super::handlers::Tone::Enthusiastic => format!(
            "I am thrilled to apply for the {role} role at {company}."
        ),
        super::handlers::Tone::Formal => format!(
            "I wish to formally submit my application for the {role} position at {company}."
        ),
        super::handlers::Tone::Professional => format!(
            "I am writing to express my strong interest in the {role} position at {company}."
        ),
    };

    format!(
        "Dear Hiring Manager,\n\n{opener} With my background and proven track record of \
delivering results, I am confident I would be a valuable addition to your team.\n\n\
Throughout my career I have developed the skills outlined in your posting and applied \
them to achieve measurable outcomes. I am particularly drawn to this opportunity because \
it aligns with my experience and professional goals.\n\n\
I would welcome the chance to discuss how my qualifications match your needs. Thank you \
for your time and consideration.\n\nSincerely,\n{full_name}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::super::handlers::Tone;
    use super::*;

    const GOOD_LETTER: &str = "Dear Hiring Manager,\n\nI am excited to apply for the Backend \
Developer role at Acme Corp. In my previous position I led a team of 4 engineers and \
improved deployment times by 60%. My experience spans seven years of production systems, \
and I have delivered projects that achieved significant cost savings. I worked closely \
with product teams to ship features that customers loved, and I improved reliability \
across the board while mentoring junior developers. This role aligns perfectly with my \
background and I would bring the same energy to your team from day one.\n\nThank you for \
your consideration.\n\nSincerely,\nJane Doe";

    #[test]
    fn strong_letter_outscores_weak_letter() {
        let posting = "Backend Developer\nCompany: Acme Corp";
        let strong = analyze(GOOD_LETTER, Some(posting));
        let weak = analyze("hire me please", Some(posting));
        assert!(strong.overall_score > weak.overall_score);
    }

    #[test]
    fn score_is_capped_below_perfection() {
        let analysis = analyze(GOOD_LETTER, Some("Backend Developer\nCompany: Acme Corp"));
        assert!(analysis.overall_score <= 95);
        assert!(analysis.tone_score <= 95);
    }

    #[test]
    fn generic_salutation_is_flagged() {
        let analysis = analyze(
            "To Whom It May Concern, I have lots of experience. Sincerely, Bob",
            None,
        );
        assert!(analysis
            .weaknesses
            .iter()
            .any(|w| w.contains("generic salutation")));
    }

    #[test]
    fn short_letter_is_penalized() {
        let analysis = analyze("Dear team, hire me. Sincerely, Bob", None);
        assert!(analysis
            .weaknesses
            .iter()
            .any(|w| w.contains("too short")));
    }

    #[test]
    fn template_reflects_posting_and_tone() {
        let letter = template_letter(
            "Jane Doe",
            "Position: Data Analyst\nCompany: Orbit Labs",
            Tone::Enthusiastic,
        );
        assert!(letter.contains("Data Analyst"));
        assert!(letter.contains("Orbit Labs"));
        assert!(letter.contains("thrilled"));
        assert!(letter.ends_with("Jane Doe\n"));
    }
}
