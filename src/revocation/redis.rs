// ABOUTME: Redis revocation store shared by every service instance
// ABOUTME: SET EX / SET NX EX for revocation records, EXISTS for checks, startup retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::time::Duration as StdDuration;

use chrono::Duration;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, Script};
use tokio::time;
use tracing::{error, info, warn};

use super::{revocation_key, RevocationError, RevocationStore};
use crate::config::environment::RevocationConfig;
use crate::config::redis::RedisConnectionConfig;

/// Write the record unless one with a longer remaining TTL already exists
const REVOKE_SCRIPT: &str = r"
local current = redis.call('TTL', KEYS[1])
if current < tonumber(ARGV[1]) then
    redis.call('SET', KEYS[1], '1', 'EX', ARGV[1])
end
";

/// Redis-backed revocation store
///
/// Uses Redis `ConnectionManager` for automatic reconnection. The manager is cheap to clone
/// and multiplexes commands, so no client-side locking is needed.
#[derive(Clone)]
pub struct RedisRevocationStore {
    manager: ConnectionManager,
    key_prefix: String,
}

impl RedisRevocationStore {
    /// Connect to Redis
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is missing or invalid, or the connection cannot be
    /// established after the configured retries
    pub async fn new(config: &RevocationConfig) -> Result<Self, RevocationError> {
        let Some(redis_url) = config.redis_url.as_deref() else {
            return Err(RevocationError::StoreUnavailable(
                "REDIS_URL must be set for the redis revocation backend".to_owned(),
            ));
        };
        let client = Client::open(redis_url).map_err(|e| {
            RevocationError::StoreUnavailable(format!("invalid Redis URL: {e}"))
        })?;

        let tuning = &config.redis_connection;
        info!(
            connect_timeout_secs = tuning.connection_timeout_secs,
            response_timeout_secs = tuning.response_timeout_secs,
            startup_attempts = tuning.initial_connection_retries + 1,
            "Connecting revocation store to Redis"
        );
        let manager = Self::connect(&client, tuning).await?;
        info!(key_prefix = %config.key_prefix, "Redis revocation store ready");

        Ok(Self {
            manager,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Open a managed connection, backing off between failed startup attempts
    ///
    /// Reconnection after startup is left to the `ConnectionManager` itself.
    async fn connect(
        client: &Client,
        tuning: &RedisConnectionConfig,
    ) -> Result<ConnectionManager, RevocationError> {
        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(StdDuration::from_secs(tuning.connection_timeout_secs))
            .set_response_timeout(StdDuration::from_secs(tuning.response_timeout_secs))
            .set_number_of_retries(tuning.reconnection_retries)
            .set_exponent_base(tuning.retry_exponent_base)
            .set_max_delay(tuning.max_retry_delay_ms);

        let attempts = tuning.initial_connection_retries + 1;
        let mut backoff = StdDuration::from_millis(tuning.initial_retry_delay_ms);
        let backoff_cap = StdDuration::from_millis(tuning.max_retry_delay_ms);
        let mut attempt = 1;

        loop {
            let failure =
                match ConnectionManager::new_with_config(client.clone(), manager_config.clone())
                    .await
                {
                    Ok(manager) => return Ok(manager),
                    Err(e) => e,
                };

            if attempt >= attempts {
                return Err(RevocationError::StoreUnavailable(format!(
                    "Redis unreachable after {attempts} attempts: {failure}"
                )));
            }

            warn!(
                attempt,
                attempts,
                backoff_ms = backoff.as_millis(),
                error = %failure,
                "Redis connection failed, backing off"
            );
            time::sleep(backoff).await;
            backoff = (backoff * 2).min(backoff_cap);
            attempt += 1;
        }
    }

    fn build_key(&self, token: &str) -> String {
        revocation_key(&self.key_prefix, token)
    }
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        let Ok(ttl_secs) = u64::try_from(ttl.num_seconds()) else {
            return Ok(());
        };
        if ttl_secs == 0 {
            return Ok(());
        }

        let redis_key = self.build_key(token);
        let mut conn = self.manager.clone();

        Script::new(REVOKE_SCRIPT)
            .key(&redis_key)
            .arg(ttl_secs)
            .invoke_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                error!(error = %e, "Redis revocation write failed");
                RevocationError::StoreUnavailable(e.to_string())
            })
    }

    async fn revoke_once(&self, token: &str, ttl: Duration) -> Result<bool, RevocationError> {
        let Ok(ttl_secs) = u64::try_from(ttl.num_seconds()) else {
            return Ok(false);
        };
        if ttl_secs == 0 {
            return Ok(false);
        }

        let redis_key = self.build_key(token);
        let mut conn = self.manager.clone();

        // SET NX replies OK when it wrote the key and nil when the key already existed
        let reply: Option<String> = redis::cmd("SET")
            .arg(&redis_key)
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!(error = %e, "Redis conditional revocation write failed");
                RevocationError::StoreUnavailable(e.to_string())
            })?;

        Ok(reply.is_some())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let redis_key = self.build_key(token);
        let mut conn = self.manager.clone();

        conn.exists(&redis_key).await.map_err(|e| {
            error!(error = %e, "Redis revocation lookup failed");
            RevocationError::StoreUnavailable(e.to_string())
        })
    }

    async fn health_check(&self) -> Result<(), RevocationError> {
        let mut conn = self.manager.clone();

        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| RevocationError::StoreUnavailable(format!("PING failed: {e}")))?;

        match reply.as_str() {
            "PONG" => Ok(()),
            other => Err(RevocationError::StoreUnavailable(format!(
                "unexpected PING reply '{other}'"
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
