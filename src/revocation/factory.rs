// ABOUTME: Revocation store factory for environment-based backend selection
// ABOUTME: Redis when REDIS_URL is configured, in-memory otherwise
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use super::memory::InMemoryRevocationStore;
use super::redis::RedisRevocationStore;
use super::{RevocationError, RevocationStore};
use crate::clock::Clock;
use crate::config::environment::RevocationConfig;

/// Unified revocation store over the configured backend
#[derive(Clone)]
pub enum RevocationBackend {
    /// Process-local store
    Memory(InMemoryRevocationStore),
    /// Shared Redis store
    Redis(RedisRevocationStore),
}

impl RevocationBackend {
    /// Create the backend described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if a Redis URL is configured but the connection fails
    pub async fn new(
        config: &RevocationConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RevocationError> {
        if config.redis_url.is_some() {
            info!("Initializing Redis revocation store");
            let store = RedisRevocationStore::new(config).await?;
            return Ok(Self::Redis(store));
        }

        warn!("REDIS_URL not set: using in-memory revocation store (revocations are not shared across instances)");
        Ok(Self::Memory(InMemoryRevocationStore::new(config, clock)))
    }
}

#[async_trait::async_trait]
impl RevocationStore for RevocationBackend {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        match self {
            Self::Memory(store) => store.revoke(token, ttl).await,
            Self::Redis(store) => store.revoke(token, ttl).await,
        }
    }

    async fn revoke_once(&self, token: &str, ttl: Duration) -> Result<bool, RevocationError> {
        match self {
            Self::Memory(store) => store.revoke_once(token, ttl).await,
            Self::Redis(store) => store.revoke_once(token, ttl).await,
        }
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        match self {
            Self::Memory(store) => store.is_revoked(token).await,
            Self::Redis(store) => store.is_revoked(token).await,
        }
    }

    async fn health_check(&self) -> Result<(), RevocationError> {
        match self {
            Self::Memory(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(store) => store.backend_name(),
            Self::Redis(store) => store.backend_name(),
        }
    }
}
