//! Bearer tokens for Studio authors
//!
//! A token names the author on whose behalf a request creates or edits
//! blocks. Tokens are HMAC-signed and must match the configured issuer and
//! audience; the subject becomes the `edited_by` user of every write the
//! request makes, so a token without a usable subject is never accepted.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, errors::ErrorKind, Algorithm, DecodingKey,
    EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use studio_bridge_core::UserId;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_SECRET: &str = "change-me-in-production";

pub const DEFAULT_ISSUER: &str = "studio-bridge";

pub const DEFAULT_AUDIENCE: &str = "studio-bridge-api";

/// One hour
const DEFAULT_TTL_SECONDS: i64 = 3600;

/// Signing and verification settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: String,

    /// Lifetime of issued tokens
    pub expiration_seconds: i64,

    pub issuer: String,

    pub audience: String,

    pub algorithm: Algorithm,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_seconds: DEFAULT_TTL_SECONDS,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            algorithm: Algorithm::HS256,
        }
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    pub fn with_expiration(mut self, seconds: i64) -> Self {
        self.expiration_seconds = seconds;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Reject settings that could never verify a token
    pub fn validate(&self) -> Result<(), JwtConfigError> {
        if self.secret.is_empty() {
            return Err(JwtConfigError::EmptySecret);
        }
        if self.expiration_seconds <= 0 {
            return Err(JwtConfigError::InvalidExpiration);
        }
        if self.issuer.is_empty() {
            return Err(JwtConfigError::EmptyIssuer);
        }
        if self.audience.is_empty() {
            return Err(JwtConfigError::EmptyAudience);
        }

        if self.secret == DEFAULT_SECRET {
            tracing::warn!("Author tokens are signed with the built-in secret; set auth.jwt_secret");
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum JwtConfigError {
    #[error("auth.jwt_secret cannot be empty")]
    EmptySecret,

    #[error("auth.expiration_seconds must be positive")]
    InvalidExpiration,

    #[error("auth.issuer cannot be empty")]
    EmptyIssuer,

    #[error("auth.audience cannot be empty")]
    EmptyAudience,
}

/// Registered claims of an author token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Author id
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
}

impl Claims {
    /// Claims naming `author`, valid from now for `ttl_seconds`.
    /// A negative lifetime yields claims that are already expired.
    pub fn new(
        author: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl_seconds: i64,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: author.into(),
            iss: issuer.into(),
            aud: audience.into(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        }
    }

    /// The author edits are attributed to
    pub fn author(&self) -> UserId {
        UserId::new(self.sub.trim())
    }

    /// Subjects must name someone: not blank and free of control characters
    fn check_author(&self) -> Result<(), TokenError> {
        if self.sub.trim().is_empty() || self.sub.chars().any(char::is_control) {
            return Err(TokenError::MissingAuthor);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token does not name an author")]
    MissingAuthor,

    #[error("authorization header is not a bearer token")]
    Malformed,

    #[error("token rejected: {0}")]
    Rejected(#[from] JwtError),
}

/// Take the token out of an `Authorization` header value.
///
/// The scheme is matched case-insensitively and exactly one token must
/// follow it.
pub fn bearer_token(header_value: &str) -> Result<&str, TokenError> {
    let mut parts = header_value.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(TokenError::Malformed),
    }
}

/// Issues and verifies author tokens
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Result<Self, JwtConfigError> {
        config.validate()?;

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.validate_nbf = true;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Token for `author` with the configured issuer, audience and lifetime
    pub fn issue_token(&self, author: impl Into<String>) -> Result<String, TokenError> {
        let claims = Claims::new(
            author,
            &self.config.issuer,
            &self.config.audience,
            self.config.expiration_seconds,
        );
        self.sign(&claims)
    }

    /// Sign caller-built claims; authorless claims are refused
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        claims.check_author()?;
        let token = encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Check signature, issuer, audience, lifetime and author
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Rejected(e),
            })?
            .claims;

        claims.check_author()?;
        Ok(claims)
    }
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("unit-test-secret")
            .with_issuer("studio")
            .with_audience("bridge")
    }

    fn manager() -> JwtManager {
        JwtManager::new(config()).unwrap()
    }

    /// Sign claims without the author check, as a foreign issuer might
    fn sign_unchecked(claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(config().validate().is_ok());
        assert!(matches!(
            JwtConfig::new("").validate(),
            Err(JwtConfigError::EmptySecret)
        ));
        assert!(matches!(
            config().with_expiration(0).validate(),
            Err(JwtConfigError::InvalidExpiration)
        ));
        assert!(matches!(
            config().with_audience("").validate(),
            Err(JwtConfigError::EmptyAudience)
        ));
    }

    #[test]
    fn test_issued_token_names_author() {
        let manager = manager();
        let claims = manager.verify(&manager.issue_token("author-7").unwrap()).unwrap();

        assert_eq!(claims.author(), UserId::new("author-7"));
        assert_eq!(claims.iss, "studio");
        assert_eq!(claims.aud, "bridge");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let other = JwtManager::new(config().with_issuer("elsewhere")).unwrap();
        let token = other.issue_token("author-7").unwrap();

        assert!(matches!(manager().verify(&token), Err(TokenError::Rejected(_))));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let manager = manager();
        let token = manager
            .sign(&Claims::new("author-7", "studio", "bridge", -3600))
            .unwrap();

        assert!(matches!(manager.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_blank_author_is_never_accepted() {
        let manager = manager();
        for subject in ["", "   ", "author\n7"] {
            let claims = Claims::new(subject, "studio", "bridge", 60);
            assert!(matches!(manager.sign(&claims), Err(TokenError::MissingAuthor)));
            assert!(matches!(
                manager.verify(&sign_unchecked(&claims)),
                Err(TokenError::MissingAuthor)
            ));
        }
    }

    #[test]
    fn test_author_is_trimmed() {
        let claims = Claims::new(" author-7 ", "studio", "bridge", 60);
        assert_eq!(claims.author().as_str(), "author-7");
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token("bearer abc").unwrap(), "abc");
        assert!(matches!(bearer_token("abc"), Err(TokenError::Malformed)));
        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("Bearer a b").is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(manager().verify("not.a.token").is_err());
    }
}
