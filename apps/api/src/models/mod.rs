pub mod usage;
pub mod user;
