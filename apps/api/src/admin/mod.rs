//! Administrative user management and platform statistics.

pub mod handlers;
