//! Session token codec.
//!
//! Issues and verifies signed, time-boxed JWTs carrying the user id as
//! subject. Tokens are stateless: nothing is stored server-side and every
//! call verifies signature and expiry independently.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Fixed issuer claim on every token.
pub const ISSUER: &str = "authgate";

const DAY_IN_SECONDS: i64 = 24 * 60 * 60;

/// Verification failures, distinguished internally so the HTTP facade can
/// word its 401s differently.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is invalid")]
    Malformed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// Subject: user id as 32-char lowercase hex
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token id, fresh per issue
    pub jti: String,
}

/// Codec over a static symmetric key (HS256).
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for the given subject, valid for 24 hours.
    pub fn issue(&self, subject: Uuid) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: subject.simple().to_string(),
            exp: now + DAY_IN_SECONDS,
            iat: now,
            jti: Uuid::new_v4().simple().to_string(),
        };

        debug!("Issuing session token for subject {}", claims.sub);

        encode(&Header::default(), &claims, &self.encoding).context("Failed to sign session token")
    }

    /// Verify a token and return its subject.
    ///
    /// # Errors
    ///
    /// [`TokenError::Expired`] when the signature is valid but `exp` has
    /// passed; [`TokenError::Malformed`] for every other decode failure
    /// (bad signature, wrong issuer, wrong claim shape, garbage input).
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-key-0123456789abcdef0123456789abcdef";

    fn encode_raw(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let codec = TokenCodec::new(SECRET);
        let subject = Uuid::new_v4();

        let token = codec.issue(subject).unwrap();
        assert!(!token.is_empty());

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified, subject);
    }

    #[test]
    fn test_fresh_tokens_differ() {
        // jti is random, so two tokens for one subject never collide
        let codec = TokenCodec::new(SECRET);
        let subject = Uuid::new_v4();

        let a = codec.issue(subject).unwrap();
        let b = codec.issue(subject).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let codec = TokenCodec::new(SECRET);
        let other = TokenCodec::new("another-signing-key-0123456789abcdef01234567");

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(codec.verify(&token), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: Uuid::new_v4().simple().to_string(),
            exp: now - 3600,
            iat: now - 7200,
            jti: Uuid::new_v4().simple().to_string(),
        };

        let token = encode_raw(&claims, SECRET);
        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();

        let claims = Claims {
            iss: "someone-else".to_string(),
            sub: Uuid::new_v4().simple().to_string(),
            exp: now + 3600,
            iat: now,
            jti: Uuid::new_v4().simple().to_string(),
        };

        let token = encode_raw(&claims, SECRET);
        assert!(matches!(codec.verify(&token), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = TokenCodec::new(SECRET);
        assert!(matches!(
            codec.verify("not.a.token"),
            Err(TokenError::Malformed)
        ));
        assert!(matches!(codec.verify(""), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let codec = TokenCodec::new(SECRET);
        let now = Utc::now().timestamp();

        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: "not-a-uuid".to_string(),
            exp: now + 3600,
            iat: now,
            jti: Uuid::new_v4().simple().to_string(),
        };

        let token = encode_raw(&claims, SECRET);
        assert!(matches!(codec.verify(&token), Err(TokenError::Malformed)));
    }
}
