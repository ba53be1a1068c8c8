//! Resume analysis, generation and ATS keyword scoring.

pub mod ats;
pub mod extract_text;
pub mod handlers;
pub mod prompts;
