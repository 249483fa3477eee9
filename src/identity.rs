// ABOUTME: Identity store seam used by login and request authentication
// ABOUTME: In-memory bcrypt-backed implementation seeded with a bootstrap admin
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Identity Store
//!
//! The session subsystem never owns user records. It asks an [`IdentityStore`] two
//! questions: do these credentials belong to someone, and does this subject still exist.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokenward_core::constants::roles;
use tokenward_core::errors::{AppError, AppResult};
use tokio::sync::{OnceCell, RwLock};
use tokio::task;
use tracing::{info, warn};

use crate::config::environment::AdminBootstrapConfig;

/// Authenticated principal bound to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Username; the `sub` claim
    pub subject: String,
    /// Role names (e.g. `ADMIN`, `USER`)
    pub roles: Vec<String>,
}

impl Identity {
    /// Whether the identity carries `role`
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Source of user records
#[async_trait::async_trait]
pub trait IdentityStore: Send + Sync {
    /// Check a username/password pair; `None` when either is wrong
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself fails
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<Identity>>;

    /// Look up a subject named by a verified credential
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself fails
    async fn find(&self, subject: &str) -> AppResult<Option<Identity>>;
}

struct StoredUser {
    password_hash: String,
    roles: Vec<String>,
}

/// Process-local user table with bcrypt password hashes
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<String, StoredUser>>,
    bcrypt_cost: u32,
    /// Hash checked for unknown usernames so a miss costs the same as a wrong password
    dummy_hash: OnceCell<String>,
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityStore {
    /// Empty store hashing with the bcrypt default cost
    #[must_use]
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    /// Empty store with an explicit bcrypt cost (tests use the minimum)
    #[must_use]
    pub fn with_cost(bcrypt_cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            bcrypt_cost,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Store seeded with the configured bootstrap admin, if any
    ///
    /// # Errors
    ///
    /// Returns an error if hashing the bootstrap password fails
    pub async fn bootstrap(admin: Option<&AdminBootstrapConfig>) -> AppResult<Self> {
        let store = Self::new();
        if let Some(admin) = admin {
            store
                .add_user(
                    &admin.username,
                    &admin.password,
                    vec![roles::ADMIN.to_owned(), roles::USER.to_owned()],
                )
                .await?;
            info!(user.id = %admin.username, "Seeded bootstrap admin account");
        }
        Ok(store)
    }

    /// Add or replace a user
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails
    pub async fn add_user(&self, username: &str, password: &str, roles: Vec<String>) -> AppResult<()> {
        let password_hash = hash_blocking(password, self.bcrypt_cost).await?;

        let replaced = self
            .users
            .write()
            .await
            .insert(username.to_owned(), StoredUser { password_hash, roles })
            .is_some();
        if replaced {
            warn!(user.id = %username, "Replaced existing user record");
        }
        Ok(())
    }

    /// Remove a user; their outstanding credentials stop resolving
    pub async fn remove_user(&self, username: &str) -> bool {
        self.users.write().await.remove(username).is_some()
    }

    async fn dummy_hash(&self) -> AppResult<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_blocking("tokenward-unknown-user", self.bcrypt_cost))
            .await?;
        Ok(hash)
    }
}

async fn hash_blocking(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_owned();
    task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal("Password hashing task failed").with_source(e))?
        .map_err(|e| AppError::internal("Password hashing failed").with_source(e))
}

async fn verify_blocking(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let matches = task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal("Password verification task failed").with_source(e))?
        // a corrupt stored hash is treated as a non-match
        .unwrap_or(false);
    Ok(matches)
}

#[async_trait::async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<Identity>> {
        let record = {
            let users = self.users.read().await;
            users
                .get(username)
                .map(|user| (user.password_hash.clone(), user.roles.clone()))
        };

        let Some((password_hash, roles)) = record else {
            // same bcrypt work as a wrong password, result discarded
            verify_blocking(password, self.dummy_hash().await?).await?;
            return Ok(None);
        };

        let matches = verify_blocking(password, &password_hash).await?;
        Ok(matches.then(|| Identity {
            subject: username.to_owned(),
            roles,
        }))
    }

    async fn find(&self, subject: &str) -> AppResult<Option<Identity>> {
        Ok(self.users.read().await.get(subject).map(|user| Identity {
            subject: subject.to_owned(),
            roles: user.roles.clone(),
        }))
    }
}
