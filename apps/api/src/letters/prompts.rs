//! Prompt construction for cover letter generation and analysis.

pub const WRITER_SYSTEM: &str = "You are an expert career coach who writes compelling, tailored \
cover letters. Return only the letter text with no additional commentary.";

pub const ANALYST_SYSTEM: &str = "You are an expert career coach who critiques cover letters with \
specific, actionable feedback. Always respond with properly formatted JSON.";

pub fn generation_prompt(full_name: &str, job_posting: &str, tone: &str, resume_text: Option<&str>) -> String {
    let background = resume_text
        .map(|r| format!("Candidate background:\n{r}\n"))
        .unwrap_or_default();

    format!(
        r#"Write a cover letter for {full_name} applying to this job:

{job_posting}

{background}Tone: {tone}
Keep it between 250 and 400 words, three or four paragraphs.
Reference the company and role specifically where the posting names them.
Return ONLY the letter text."#
    )
}

pub fn analysis_prompt(letter: &str, job_posting: Option<&str>) -> String {
    let context = job_posting
        .map(|p| format!("Job posting for context:\n{p}"))
        .unwrap_or_else(|| "No job posting provided".to_string());

    format!(
        r#"Analyze this cover letter and provide detailed feedback.

Cover Letter:
{letter}

{context}

Respond in this EXACT JSON format:
{{
    "overall_score": <score from 1-100>,
    "tone_score": <score from 1-100>,
    "relevance_score": <score from 1-100>,
    "strengths": ["<specific strength>", "..."],
    "weaknesses": ["<specific weakness>", "..."],
    "improvements": ["<actionable suggestion>", "..."]
}}

Be specific and reference actual content from the letter."#
    )
}
