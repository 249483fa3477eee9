// ABOUTME: RS256 token codec that signs, verifies and classifies access/refresh credentials
// ABOUTME: Maps jsonwebtoken failures onto expired, signature-invalid and malformed outcomes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Token Codec
//!
//! Credentials are compact RS256 JWS strings carrying `sub`, `iat`, `exp`, `jti` and a
//! `type` claim naming the credential kind. Timestamps are whole Unix seconds and a
//! credential is live while `exp > now`.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokenward_core::constants::tokens::{ACCESS_TOKEN_TYPE, REFRESH_TOKEN_TYPE};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::keys::{KeyLoadError, KeyProvider};

/// Credential kind carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Short-lived bearer credential
    #[serde(rename = "access_token")]
    Access,
    /// Long-lived credential, only accepted by the refresh endpoint
    #[serde(rename = "refresh_token")]
    Refresh,
}

impl TokenKind {
    /// Wire value of the `type` claim
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => ACCESS_TOKEN_TYPE,
            Self::Refresh => REFRESH_TOKEN_TYPE,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
    /// Unique credential id; two credentials minted in the same second still differ
    pub jti: String,
    /// Credential kind
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// Token codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature valid, `exp <= now`
    #[error("token expired at {expired_at} (now {now})")]
    Expired {
        /// `exp` claim
        expired_at: i64,
        /// Clock reading at verification
        now: i64,
    },
    /// Signature does not verify against the public key
    #[error("token signature verification failed")]
    SignatureInvalid,
    /// Not a decodable credential, or a claim is missing/unknown
    #[error("token is malformed: {0}")]
    Malformed(String),
    /// Signing failed
    #[error("token issuance failed: {0}")]
    Issuance(String),
    /// Key pair could not be loaded
    #[error(transparent)]
    KeyUnavailable(#[from] KeyLoadError),
}

/// Signs and verifies credentials with the RS256 key pair
#[derive(Debug, Clone)]
pub struct TokenCodec {
    keys: Arc<KeyProvider>,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec over a key provider and a time source
    #[must_use]
    pub fn new(keys: Arc<KeyProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { keys, clock }
    }

    /// Current time according to the codec's clock
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Sign a new credential for `subject` valid for `ttl`
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::KeyUnavailable`] if the private key cannot be loaded, or
    /// [`TokenError::Issuance`] if signing fails
    pub async fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let signing_key = self.keys.signing_key().await?;

        let iat = self.clock.now();
        let exp = iat
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| TokenError::Issuance(format!("lifetime {ttl} overflows exp")))?;
        let claims = Claims {
            sub: subject.to_owned(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
            kind,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(signing_key.kid().to_owned());

        let token = encode(&header, &claims, signing_key.encoding_key())
            .map_err(|e| TokenError::Issuance(e.to_string()))?;

        debug!(sub = %claims.sub, kind = %kind, exp = claims.exp, "Issued token");
        Ok(token)
    }

    /// Verify signature then expiry
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::SignatureInvalid`], [`TokenError::Malformed`] or
    /// [`TokenError::Expired`]; [`TokenError::KeyUnavailable`] if the public key cannot
    /// be loaded
    pub async fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify_signature(token).await?;

        let now = self.clock.now();
        if claims.exp <= now {
            debug!(sub = %claims.sub, exp = claims.exp, now, "Token expired");
            return Err(TokenError::Expired {
                expired_at: claims.exp,
                now,
            });
        }

        Ok(claims)
    }

    /// Verify the signature only; expiry is not checked
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify`] without [`TokenError::Expired`]
    pub async fn verify_signature(&self, token: &str) -> Result<Claims, TokenError> {
        let verification_key = self.keys.verification_key().await?;

        // exp is checked against the injected clock, not the library's wall clock
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        decode::<Claims>(token, verification_key.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| convert_jwt_error(&e))
    }

    /// Signature-checked read of the credential kind
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Malformed`] if the `type` claim is absent or unrecognized, or
    /// any signature failure from [`Self::verify_signature`]
    pub async fn kind_of(&self, token: &str) -> Result<TokenKind, TokenError> {
        self.verify_signature(token).await.map(|claims| claims.kind)
    }

    /// Seconds left before `claims` expire; zero or negative once expired
    #[must_use]
    pub fn remaining_lifetime(&self, claims: &Claims) -> Duration {
        let secs = claims.exp.saturating_sub(self.clock.now());
        Duration::try_seconds(secs).unwrap_or(if secs < 0 { Duration::MIN } else { Duration::MAX })
    }
}

/// Convert JWT library errors to codec errors
fn convert_jwt_error(e: &JwtError) -> TokenError {
    match e.kind() {
        ErrorKind::InvalidSignature => {
            warn!("Token signature verification failed");
            TokenError::SignatureInvalid
        }
        ErrorKind::InvalidToken => TokenError::Malformed("token format is invalid".to_owned()),
        ErrorKind::Base64(base64_err) => {
            TokenError::Malformed(format!("invalid base64: {base64_err}"))
        }
        ErrorKind::Json(json_err) => TokenError::Malformed(format!("invalid claims: {json_err}")),
        ErrorKind::Utf8(utf8_err) => TokenError::Malformed(format!("invalid UTF-8: {utf8_err}")),
        ErrorKind::InvalidAlgorithm => {
            TokenError::Malformed("unexpected signing algorithm".to_owned())
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            TokenError::Malformed(format!("missing claim '{claim}'"))
        }
        _ => {
            warn!("Token validation failed: {e}");
            TokenError::Malformed(e.to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_type_claim_wire_format() {
        let claims = Claims {
            sub: "alice".to_owned(),
            iat: 10,
            exp: 20,
            jti: "j".to_owned(),
            kind: TokenKind::Refresh,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh_token");

        let unknown = serde_json::json!({
            "sub": "alice", "iat": 10, "exp": 20, "jti": "j", "type": "id_token"
        });
        assert!(serde_json::from_value::<Claims>(unknown).is_err());
    }

    #[test]
    fn test_invalid_signature_maps_to_signature_invalid() {
        let err = JwtError::from(ErrorKind::InvalidSignature);
        assert_eq!(convert_jwt_error(&err), TokenError::SignatureInvalid);

        let err = JwtError::from(ErrorKind::InvalidToken);
        assert!(matches!(convert_jwt_error(&err), TokenError::Malformed(_)));
    }
}
