//! Interview preparation, answer feedback and company research.

pub mod handlers;
