//! Cover letter generation and analysis.

pub mod handlers;
pub mod heuristics;
pub mod posting;
pub mod prompts;
