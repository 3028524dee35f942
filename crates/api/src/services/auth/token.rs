//! Signed bearer tokens.
//!
//! A token is `base64url(claims JSON) "." base64url(HMAC-SHA256(payload))`,
//! both parts without padding. The signature covers the encoded payload, so
//! the payload is never parsed before its signature checks out.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use strive_core::{Role, UserId};

use crate::models::user::User;

type HmacSha256 = Hmac<Sha256>;

/// Errors from issuing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Not two base64url parts, or the payload is not valid claims.
    #[error("malformed token")]
    Malformed,

    /// Signature does not match.
    #[error("invalid token signature")]
    BadSignature,

    /// Past its expiry.
    #[error("token expired")]
    Expired,

    /// The secret was rejected as an HMAC key.
    #[error("invalid signing key")]
    Key,

    /// Claims could not be serialized.
    #[error("failed to encode claims: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What a token says about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub role: Role,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

impl Claims {
    /// Whether the bearer is ADMIN or MANAGER.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

/// Issues and verifies tokens with one secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a token for `user` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if the claims fail to serialize.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token for `user` valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if the claims fail to serialize.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id,
            email: user.email.as_str().to_string(),
            role: user.role,
            exp: (now + self.ttl).timestamp(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes())?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` when the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` when the token is malformed, forged or expired.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        self.sign(payload.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::Key)?;
        mac.update(payload);
        Ok(mac)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strive_core::Email;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(SecretString::from(secret.to_string()), Duration::hours(24))
    }

    fn user(role: Role) -> User {
        User {
            id: UserId::new(12),
            email: Email::parse("staff@strive.shop").unwrap(),
            first_name: "Rui".into(),
            last_name: "Costa".into(),
            phone: None,
            country_code: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let signer = signer("k7Qp2vX9mL4tR8wZ1cF6hJ3nB5yD0sGa");
        let token = signer.issue(&user(Role::Manager)).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, UserId::new(12));
        assert_eq!(claims.role, Role::Manager);
        assert!(claims.is_staff());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = signer("k7Qp2vX9mL4tR8wZ1cF6hJ3nB5yD0sGa")
            .issue(&user(Role::Customer))
            .unwrap();
        let result = signer("Zx8Vb2Nm4Lk6Jh9Gf1Dd3Ss5Aa7Qq0Ww").verify(&token);
        assert!(matches!(result, Err(TokenError::BadSignature)));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let signer = signer("k7Qp2vX9mL4tR8wZ1cF6hJ3nB5yD0sGa");
        let token = signer.issue(&user(Role::Customer)).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = Claims {
            sub: UserId::new(12),
            email: "staff@strive.shop".into(),
            role: Role::Admin,
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{forged_payload}.{signature}");

        assert!(matches!(signer.verify(&forged), Err(TokenError::BadSignature)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let signer = signer("k7Qp2vX9mL4tR8wZ1cF6hJ3nB5yD0sGa");
        let issued = Utc::now() - Duration::hours(25);
        let token = signer.issue_at(&user(Role::Customer), issued).unwrap();
        assert!(matches!(signer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let signer = signer("k7Qp2vX9mL4tR8wZ1cF6hJ3nB5yD0sGa");
        assert!(matches!(signer.verify("no-dot-here"), Err(TokenError::Malformed)));
        assert!(matches!(signer.verify("abc.!!!"), Err(TokenError::Malformed)));
    }
}
