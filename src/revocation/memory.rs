// ABOUTME: In-memory revocation store with per-entry expiry and background cleanup
// ABOUTME: Process-local; suitable for single-instance deployments and tests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time;
use tracing::debug;

use super::{revocation_key, RevocationError, RevocationStore};
use crate::clock::Clock;
use crate::config::environment::RevocationConfig;

type Entries = Arc<RwLock<HashMap<String, i64>>>;

/// In-memory revocation store
///
/// Entries map the hashed credential key to the Unix second at which the record expires.
/// There is no capacity bound: evicting a live entry early would un-revoke a credential.
/// Expired entries are dropped lazily on lookup and by the optional sweep task.
#[derive(Clone)]
pub struct InMemoryRevocationStore {
    entries: Entries,
    key_prefix: String,
    clock: Arc<dyn Clock>,
    shutdown_tx: Option<Arc<mpsc::Sender<()>>>,
}

impl InMemoryRevocationStore {
    /// Create a new store, spawning the sweep task when enabled
    ///
    /// Must be called inside a tokio runtime when `enable_background_cleanup` is set.
    #[must_use]
    pub fn new(config: &RevocationConfig, clock: Arc<dyn Clock>) -> Self {
        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));

        let shutdown_tx = if config.enable_background_cleanup {
            let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
            let entries_clone = entries.clone();
            let clock_clone = clock.clone();
            let cleanup_interval = config.cleanup_interval;

            tokio::spawn(async move {
                let mut interval = time::interval(cleanup_interval);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            Self::cleanup_expired(&entries_clone, clock_clone.now()).await;
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("Revocation cleanup task received shutdown signal");
                            break;
                        }
                    }
                }
            });

            Some(Arc::new(shutdown_tx))
        } else {
            None
        };

        Self {
            entries,
            key_prefix: config.key_prefix.clone(),
            clock,
            shutdown_tx,
        }
    }

    /// Remove all expired entries
    async fn cleanup_expired(entries: &Entries, now: i64) {
        let mut guard = entries.write().await;
        let before = guard.len();
        guard.retain(|_, expires_at| *expires_at > now);
        let removed = before - guard.len();
        drop(guard);

        if removed > 0 {
            debug!("Cleaned up {} expired revocation entries", removed);
        }
    }

    /// Sweep now instead of waiting for the background interval
    pub async fn purge_expired(&self) {
        Self::cleanup_expired(&self.entries, self.clock.now()).await;
    }

    /// Number of stored entries, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        let ttl_secs = ttl.num_seconds();
        if ttl_secs <= 0 {
            return Ok(());
        }

        let expires_at = self.clock.now() + ttl_secs;
        let key = revocation_key(&self.key_prefix, token);

        // a later revoke with a shorter ttl must not shorten an existing record
        let mut guard = self.entries.write().await;
        let entry = guard.entry(key).or_insert(expires_at);
        *entry = (*entry).max(expires_at);
        drop(guard);

        Ok(())
    }

    async fn revoke_once(&self, token: &str, ttl: Duration) -> Result<bool, RevocationError> {
        let ttl_secs = ttl.num_seconds();
        if ttl_secs <= 0 {
            return Ok(false);
        }

        let now = self.clock.now();
        let key = revocation_key(&self.key_prefix, token);

        let mut guard = self.entries.write().await;
        let created = match guard.entry(key) {
            Entry::Occupied(mut entry) if *entry.get() <= now => {
                entry.insert(now + ttl_secs);
                true
            }
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(now + ttl_secs);
                true
            }
        };
        drop(guard);

        Ok(created)
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let key = revocation_key(&self.key_prefix, token);
        let now = self.clock.now();

        let expires_at = self.entries.read().await.get(&key).copied();
        match expires_at {
            Some(expires_at) if expires_at > now => Ok(true),
            Some(_) => {
                let mut guard = self.entries.write().await;
                // re-check: a concurrent revoke may have extended the record
                if guard.get(&key).is_some_and(|expires_at| *expires_at <= now) {
                    guard.remove(&key);
                }
                drop(guard);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), RevocationError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl Drop for InMemoryRevocationStore {
    fn drop(&mut self) {
        // Only the last clone holds the sole Arc to the sender
        if let Some(tx) = &self.shutdown_tx {
            if Arc::strong_count(tx) == 1 {
                if let Err(e) = tx.try_send(()) {
                    debug!(error = ?e, "Revocation cleanup shutdown signal send failed");
                }
            }
        }
    }
}
