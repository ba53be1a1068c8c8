//! Subscription tier catalog, current-plan reporting and mock billing.

pub mod handlers;
