// ABOUTME: Revocation store abstraction for TTL-bounded credential blacklisting
// ABOUTME: Pluggable backends (in-memory, Redis) behind one async trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Backend selection from configuration
pub mod factory;
/// In-memory revocation store
pub mod memory;
/// Redis revocation store
pub mod redis;

use chrono::Duration;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokenward_core::constants::revocation::LOG_FINGERPRINT_LEN;
use tokenward_core::errors::AppError;

/// Revocation store failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevocationError {
    /// The backing store could not be reached or answered with an error
    #[error("revocation store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<RevocationError> for AppError {
    fn from(error: RevocationError) -> Self {
        Self::store_unavailable().with_source(error)
    }
}

/// Blacklist of credentials, each entry expiring with the credential it names
///
/// Existence of an entry is the whole signal. Entries are written with a lifetime equal to
/// the credential's remaining validity, so the store never holds a record for a credential
/// that could no longer verify anyway.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use chrono::Duration;
/// use tokenward::clock::SystemClock;
/// use tokenward::config::environment::RevocationConfig;
/// use tokenward::revocation::memory::InMemoryRevocationStore;
/// use tokenward::revocation::RevocationStore;
/// # async fn example() -> Result<(), tokenward::revocation::RevocationError> {
/// let config = RevocationConfig {
///     enable_background_cleanup: false,
///     ..Default::default()
/// };
/// let store = InMemoryRevocationStore::new(&config, Arc::new(SystemClock));
///
/// store.revoke("eyJhbGciOi...", Duration::seconds(900)).await?;
/// assert!(store.is_revoked("eyJhbGciOi...").await?);
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record `token` as revoked for `ttl`; a non-positive `ttl` writes nothing
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError::StoreUnavailable`] if the write fails
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationError>;

    /// Record `token` as revoked only if no live record exists yet
    ///
    /// Returns `true` when this call created the record. Of any number of concurrent calls
    /// for the same credential, at most one sees `true`; single-use rotation relies on it.
    /// A non-positive `ttl` writes nothing and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError::StoreUnavailable`] if the write fails
    async fn revoke_once(&self, token: &str, ttl: Duration) -> Result<bool, RevocationError>;

    /// Whether an unexpired revocation record exists for `token`
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError::StoreUnavailable`] if the lookup fails
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError>;

    /// Verify the backend is reachable
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError::StoreUnavailable`] if it is not
    async fn health_check(&self) -> Result<(), RevocationError>;

    /// Short backend name for logs and readiness output
    fn backend_name(&self) -> &'static str;
}

/// Store key for a credential: namespace prefix plus SHA-256 hex of the credential
#[must_use]
pub fn revocation_key(prefix: &str, token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{prefix}{}", hex::encode(digest))
}

/// Loggable stand-in for a credential
#[must_use]
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(LOG_FINGERPRINT_LEN);
    hex
}
