// ABOUTME: Redis connection tuning for the shared revocation store
// ABOUTME: Timeouts, reconnection and startup retry settings loaded from environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use std::env;
use std::str::FromStr;

use tokenward_core::constants::redis as redis_defaults;

/// Redis connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: redis_defaults::CONNECTION_TIMEOUT_SECS,
            response_timeout_secs: redis_defaults::RESPONSE_TIMEOUT_SECS,
            reconnection_retries: redis_defaults::RECONNECTION_RETRIES,
            retry_exponent_base: redis_defaults::RETRY_EXPONENT_BASE,
            max_retry_delay_ms: redis_defaults::MAX_RETRY_DELAY_MS,
            initial_connection_retries: redis_defaults::INITIAL_CONNECTION_RETRIES,
            initial_retry_delay_ms: redis_defaults::INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl RedisConnectionConfig {
    /// Load Redis connection configuration from environment
    ///
    /// Unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            connection_timeout_secs: env_or(
                "REDIS_CONNECTION_TIMEOUT_SECS",
                defaults.connection_timeout_secs,
            ),
            response_timeout_secs: env_or(
                "REDIS_RESPONSE_TIMEOUT_SECS",
                defaults.response_timeout_secs,
            ),
            reconnection_retries: env_or("REDIS_RECONNECTION_RETRIES", defaults.reconnection_retries),
            retry_exponent_base: env_or("REDIS_RETRY_EXPONENT_BASE", defaults.retry_exponent_base),
            max_retry_delay_ms: env_or("REDIS_MAX_RETRY_DELAY_MS", defaults.max_retry_delay_ms),
            initial_connection_retries: env_or(
                "REDIS_INITIAL_CONNECTION_RETRIES",
                defaults.initial_connection_retries,
            ),
            initial_retry_delay_ms: env_or(
                "REDIS_INITIAL_RETRY_DELAY_MS",
                defaults.initial_retry_delay_ms,
            ),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
