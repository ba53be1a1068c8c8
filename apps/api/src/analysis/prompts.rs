//! Prompt construction for resume analysis and generation.

pub const ANALYST_SYSTEM: &str = "You are an expert career coach and HR professional who provides \
detailed, actionable resume analysis. Always respond with properly formatted JSON.";

pub const WRITER_SYSTEM: &str = "You are an expert career coach and professional writer who creates \
ATS-friendly resumes. Always provide only the resume content without additional commentary.";

pub fn analysis_prompt(resume_text: &str, target_role: Option<&str>) -> String {
    let context = target_role
        .map(|r| format!("Target Role: {r}"))
        .unwrap_or_else(|| "No specific role provided".to_string());

    format!(
        r#"Analyze this resume and provide detailed, actionable feedback.

Resume to Analyze:
{resume_text}

{context}

Provide comprehensive analysis in this EXACT JSON format:
{{
    "overall_score": <score from 1-100>,
    "ats_score": <score from 1-100 for ATS optimization>,
    "formatting_score": <score from 1-100>,
    "strengths": ["<specific strength with evidence>", "..."],
    "weaknesses": ["<specific weakness with explanation>", "..."],
    "specific_improvements": ["<actionable suggestion>", "..."],
    "ats_recommendations": ["<ATS optimization tip>", "..."],
    "keyword_analysis": {{
        "missing_keywords": ["..."],
        "present_keywords": ["..."],
        "suggestions": "<how to better incorporate relevant keywords>"
    }}
}}

Be specific and actionable. Reference actual content from the resume."#
    )
}

pub fn generation_prompt(
    full_name: &str,
    contact_info: Option<&str>,
    work_history: &str,
    job_description: &str,
) -> String {
    let contact = contact_info.unwrap_or("(not provided)");
    format!(
        r#"Create a professional resume for {full_name}.
Contact Info: {contact}
Work History: {work_history}

Tailor the resume to the following job description:
{job_description}

Make it ATS-friendly with action verbs and concise bullet points.
Return ONLY the complete resume text, no additional commentary."#
    )
}
