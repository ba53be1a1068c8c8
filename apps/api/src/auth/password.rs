//! Password hashing and verification using Argon2id, plus the signup
//! strength rules.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;

/// Hashes a password, returning the PHC-formatted string that embeds the
/// salt and parameters.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))
}

/// Verifies a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid password hash format: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Signup password rules: at least 8 characters, one letter, one digit.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(
            "Password must contain at least one letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Password must contain at least one number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse-battery-1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse-battery-1", &hash).unwrap());
        assert!(!verify_password("wrong-password-2", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let h1 = hash_password("same-password-9").unwrap();
        let h2 = hash_password("same-password-9").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("abc1").is_err()); // too short
        assert!(validate_password("12345678").is_err()); // no letter
        assert!(validate_password("abcdefgh").is_err()); // no digit
        assert!(validate_password("abcdefg1").is_ok());
    }
}
