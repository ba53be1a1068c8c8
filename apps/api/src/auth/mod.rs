//! Account registration, login and request authentication.

pub mod extract;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use extract::{AdminUser, AuthUser};
pub use jwt::Jwt;
