// ABOUTME: Shared server resources handed to every route and middleware through axum state
// ABOUTME: Composition root wiring keys, codec, revocation store, identity store and sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::environment::ServerConfig;
use crate::identity::{IdentityStore, InMemoryIdentityStore};
use crate::keys::KeyProvider;
use crate::revocation::factory::RevocationBackend;
use crate::revocation::RevocationStore;
use crate::session::SessionService;
use crate::tokens::TokenCodec;

/// Everything a request handler may need, built once at startup
pub struct ServerResources {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Lazily-loaded RSA key pair
    pub keys: Arc<KeyProvider>,
    /// Token signing and verification
    pub token_codec: TokenCodec,
    /// Revocation store backend
    pub revocation: Arc<dyn RevocationStore>,
    /// Identity store
    pub identities: Arc<dyn IdentityStore>,
    /// Login, rotation and logout
    pub sessions: SessionService,
}

impl ServerResources {
    /// Wire resources from explicit collaborators
    #[must_use]
    pub fn new(
        config: ServerConfig,
        clock: Arc<dyn Clock>,
        revocation: Arc<dyn RevocationStore>,
        identities: Arc<dyn IdentityStore>,
    ) -> Self {
        let keys = Arc::new(KeyProvider::new(config.keys.clone()));
        let token_codec = TokenCodec::new(keys.clone(), clock);
        let sessions = SessionService::new(
            token_codec.clone(),
            revocation.clone(),
            identities.clone(),
            config.tokens,
        );

        Self {
            config: Arc::new(config),
            keys,
            token_codec,
            revocation,
            identities,
            sessions,
        }
    }

    /// Build production resources from configuration
    ///
    /// Keys are not read here; they load on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the revocation store cannot be reached or the bootstrap
    /// account cannot be seeded
    pub async fn from_config(config: ServerConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let revocation = RevocationBackend::new(&config.revocation, clock.clone())
            .await
            .context("Failed to initialize revocation store")?;
        info!(backend = revocation.backend_name(), "Revocation store ready");

        let identities = InMemoryIdentityStore::bootstrap(config.admin.as_ref())
            .await
            .context("Failed to seed identity store")?;

        Ok(Self::new(
            config,
            clock,
            Arc::new(revocation),
            Arc::new(identities),
        ))
    }
}
