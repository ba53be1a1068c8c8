//! Tiered usage-and-entitlement lifecycle.
//!
//! Every feature endpoint goes through the same path: the gate reads the
//! user's tier, looks the feature up in the declarative tier catalog, reads
//! the current-month counter, and permits or denies. Usage is recorded only
//! when the costed deliverable is actually handed to the user, never at
//! generation/preview time.

pub mod gate;
pub mod store;
pub mod tiers;
pub mod usage;
