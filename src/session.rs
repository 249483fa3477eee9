// ABOUTME: Session lifecycle orchestration: login, refresh-token rotation and logout
// ABOUTME: Combines identity checks, token issuance and revocation without server-side sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Session Service
//!
//! A session is nothing but the credential pair the client holds:
//!
//! ```text
//! Anonymous --login--> Authenticated(pair) --refresh--> Rotated(pair') --logout--> LoggedOut
//! ```
//!
//! Every rotation and logout revokes the refresh credential it consumes, so at most one
//! refresh credential per chain is ever honored. Rotation claims the presented credential
//! with [`RevocationStore::revoke_once`], so two concurrent rotations of the same
//! credential cannot both succeed.

use std::sync::Arc;

use tokenward_core::errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::config::environment::TokenConfig;
use crate::identity::IdentityStore;
use crate::logging::{AppLogger, Severity};
use crate::revocation::{fingerprint, RevocationStore};
use crate::tokens::{Claims, TokenCodec, TokenError, TokenKind};

/// Credential pair handed to a client
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Subject the pair was issued for
    pub subject: String,
    /// Bearer credential
    pub access_token: String,
    /// Cookie credential
    pub refresh_token: String,
    /// Access credential lifetime in seconds
    pub expires_in_secs: i64,
}

/// Which halves of a logout were actually revoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogoutOutcome {
    /// Access credential recorded in the revocation store
    pub access_revoked: bool,
    /// Refresh credential recorded in the revocation store
    pub refresh_revoked: bool,
}

/// Login, rotation and logout over a codec, a revocation store and an identity store
#[derive(Clone)]
pub struct SessionService {
    codec: TokenCodec,
    revocation: Arc<dyn RevocationStore>,
    identities: Arc<dyn IdentityStore>,
    tokens: TokenConfig,
}

impl SessionService {
    /// Create the service
    #[must_use]
    pub fn new(
        codec: TokenCodec,
        revocation: Arc<dyn RevocationStore>,
        identities: Arc<dyn IdentityStore>,
        tokens: TokenConfig,
    ) -> Self {
        Self {
            codec,
            revocation,
            identities,
            tokens,
        }
    }

    /// Authenticate a username/password pair and issue a credential pair
    ///
    /// # Errors
    ///
    /// - `INVALID_CREDENTIALS` if the identity store rejects the pair
    /// - `ISSUANCE_FAILED` if either credential cannot be signed
    pub async fn login(&self, username: &str, password: &str) -> AppResult<IssuedSession> {
        let Some(identity) = self.identities.authenticate(username, password).await? else {
            AppLogger::log_auth_event(username, "login", false, Some("invalid credentials"));
            return Err(AppError::invalid_credentials());
        };

        let session = self.issue_pair(&identity.subject).await?;
        AppLogger::log_auth_event(&identity.subject, "login", true, None);
        Ok(session)
    }

    /// Exchange a refresh credential for a new pair, revoking the one presented
    ///
    /// Revocation of the presented credential and issuance of the new pair are two separate
    /// steps. If the process dies between them the client holds a revoked credential and no
    /// replacement, and has to log in again.
    ///
    /// # Errors
    ///
    /// - `TOKEN_BLACKLISTED` if the credential was already revoked (reuse), including by a
    ///   concurrent rotation of the same credential
    /// - `TOKEN_EXPIRED` / `INVALID_TOKEN` if it does not verify
    /// - `INVALID_TOKEN` if it is an access credential or its subject no longer exists
    /// - `STORE_UNAVAILABLE` if the revocation store cannot be read or written
    /// - `ISSUANCE_FAILED` if the new pair cannot be signed
    pub async fn refresh(&self, presented: &str) -> AppResult<IssuedSession> {
        if self.revocation.is_revoked(presented).await? {
            AppLogger::log_security_event(
                "refresh_token_reuse",
                Severity::High,
                &format!("revoked refresh token presented ({})", fingerprint(presented)),
                None,
            );
            return Err(AppError::token_blacklisted());
        }

        let claims = self.codec.verify(presented).await.map_err(verification_error)?;

        if claims.kind != TokenKind::Refresh {
            warn!(sub = %claims.sub, kind = %claims.kind, "Non-refresh token presented for rotation");
            return Err(AppError::token_invalid("Refresh token required"));
        }

        if self.identities.find(&claims.sub).await?.is_none() {
            warn!(sub = %claims.sub, "Refresh token subject no longer exists");
            return Err(AppError::token_invalid("Token subject is unknown"));
        }

        let remaining = self.codec.remaining_lifetime(&claims);
        if remaining.num_seconds() <= 0 {
            return Err(AppError::token_expired());
        }
        // claim the credential; a concurrent rotation of the same one loses here
        if !self.revocation.revoke_once(presented, remaining).await? {
            AppLogger::log_security_event(
                "refresh_token_reuse",
                Severity::High,
                &format!(
                    "refresh token rotated concurrently ({})",
                    fingerprint(presented)
                ),
                Some(&claims.sub),
            );
            return Err(AppError::token_blacklisted());
        }

        let session = self.issue_pair(&claims.sub).await?;
        AppLogger::log_auth_event(&claims.sub, "refresh", true, None);
        Ok(session)
    }

    /// Revoke whichever credentials are present
    ///
    /// Each half is handled on its own. A credential that no longer verifies (expired,
    /// bad signature, malformed) has nothing left to revoke and is skipped.
    ///
    /// # Errors
    ///
    /// - `AUTH_REQUIRED` if neither credential is present
    /// - `STORE_UNAVAILABLE` if a revocation write fails
    pub async fn logout(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> AppResult<LogoutOutcome> {
        if access.is_none() && refresh.is_none() {
            return Err(AppError::auth_required());
        }

        let mut outcome = LogoutOutcome::default();
        let mut subject = None;

        if let Some(token) = access {
            if let Some(claims) = self.revoke_presented(token, TokenKind::Access).await? {
                outcome.access_revoked = true;
                subject = Some(claims.sub);
            }
        }
        if let Some(token) = refresh {
            if let Some(claims) = self.revoke_presented(token, TokenKind::Refresh).await? {
                outcome.refresh_revoked = true;
                subject.get_or_insert(claims.sub);
            }
        }

        AppLogger::log_auth_event(
            subject.as_deref().unwrap_or("unknown"),
            "logout",
            true,
            Some(&format!(
                "access_revoked={} refresh_revoked={}",
                outcome.access_revoked, outcome.refresh_revoked
            )),
        );
        Ok(outcome)
    }

    /// Revoke one credential for its remaining lifetime; `None` when there was nothing to do
    async fn revoke_presented(&self, token: &str, expected: TokenKind) -> AppResult<Option<Claims>> {
        let claims = match self.codec.verify_signature(token).await {
            Ok(claims) => claims,
            Err(TokenError::KeyUnavailable(e)) => {
                return Err(AppError::internal("Verification key unavailable").with_source(e));
            }
            Err(e) => {
                warn!(kind = %expected, token = %fingerprint(token), error = %e, "Skipping revocation of unverifiable token");
                return Ok(None);
            }
        };

        if claims.kind != expected {
            warn!(kind = %claims.kind, expected = %expected, "Token presented in the wrong slot at logout");
        }

        let ttl = self.codec.remaining_lifetime(&claims);
        if ttl.num_seconds() <= 0 {
            info!(kind = %expected, token = %fingerprint(token), "Token already expired, nothing to revoke");
            return Ok(None);
        }

        self.revocation.revoke(token, ttl).await?;
        Ok(Some(claims))
    }

    async fn issue_pair(&self, subject: &str) -> AppResult<IssuedSession> {
        let access_token = self
            .codec
            .issue(subject, TokenKind::Access, self.tokens.access_ttl())
            .await
            .map_err(issuance_error)?;
        let refresh_token = self
            .codec
            .issue(subject, TokenKind::Refresh, self.tokens.refresh_ttl())
            .await
            .map_err(issuance_error)?;

        Ok(IssuedSession {
            subject: subject.to_owned(),
            access_token,
            refresh_token,
            expires_in_secs: self.tokens.access_ttl_secs,
        })
    }
}

/// Map a verification failure onto the 401 family
pub(crate) fn verification_error(error: TokenError) -> AppError {
    match error {
        TokenError::Expired { .. } => AppError::token_expired(),
        TokenError::SignatureInvalid | TokenError::Malformed(_) => {
            AppError::token_invalid("Invalid token").with_source(error)
        }
        TokenError::KeyUnavailable(_) | TokenError::Issuance(_) => {
            AppError::internal("Verification key unavailable").with_source(error)
        }
    }
}

fn issuance_error(error: TokenError) -> AppError {
    AppError::issuance_failed().with_source(error)
}
