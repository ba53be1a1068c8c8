//! JWT access tokens, HS256-signed, 30 minute expiry.

use anyhow::{bail, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Token signer/verifier shared through `AppState`.
#[derive(Clone)]
pub struct Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Jwt {
    /// Builds the signer from the configured secret. A short secret is a
    /// deployment mistake and refuses to start.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 characters");
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn sign(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {e}")))
    }

    /// Verifies signature and expiry. Any failure is `Unauthorized`; the
    /// caller never learns which check failed.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> Jwt {
        Jwt::new("test-secret-that-is-long-enough-0123456789").unwrap()
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let jwt = jwt();
        let user_id = Uuid::new_v4();

        let token = jwt.sign(user_id).unwrap();
        let claims = jwt.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let jwt = jwt();
        let token = jwt.sign(Uuid::new_v4()).unwrap();
        let mut tampered = token;
        tampered.push('x');

        assert!(matches!(
            jwt.verify(&tampered),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = Jwt::new("another-secret-that-is-long-enough-xyz").unwrap();
        let token = other.sign(Uuid::new_v4()).unwrap();

        assert!(matches!(jwt().verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn short_secret_is_refused() {
        assert!(Jwt::new("too-short").is_err());
    }
}
