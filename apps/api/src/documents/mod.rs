//! Transient storage and delivery of generated documents.
//!
//! Documents live in process memory only and are regenerable, so losing
//! them on restart is acceptable. Download is the one action that consumes
//! the `pdf_download` quota.

pub mod handlers;
pub mod registry;

pub use registry::DocumentRegistry;
