// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Loads server, token lifetime, cookie, key path, revocation and bootstrap settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Environment-based configuration management for production deployment

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use tokenward_core::constants::{cookies, ports, revocation, tokens};
use tracing::{info, warn};

use super::redis::RedisConnectionConfig;
use crate::keys::KeyPaths;

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// What the request pipeline does when the revocation store cannot answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailMode {
    /// Reject the request with 401
    #[default]
    Closed,
    /// Skip the revocation check and continue to verification
    Open,
}

impl FromStr for FailMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            other => bail!("Unknown revocation fail mode '{other}' (expected 'closed' or 'open')"),
        }
    }
}

impl fmt::Display for FailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Credential lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenConfig {
    /// Access credential lifetime in seconds
    pub access_ttl_secs: i64,
    /// Refresh credential lifetime in seconds
    pub refresh_ttl_secs: i64,
}

impl TokenConfig {
    /// Access lifetime as a duration
    ///
    /// Saturates instead of panicking for values [`ServerConfig::validate`] would reject.
    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        saturating_seconds(self.access_ttl_secs)
    }

    /// Refresh lifetime as a duration
    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        saturating_seconds(self.refresh_ttl_secs)
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: tokens::DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: tokens::DEFAULT_REFRESH_TOKEN_TTL_SECS,
        }
    }
}

/// Refresh cookie settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    /// Cookie name
    pub name: String,
    /// `Max-Age` in seconds
    pub max_age_secs: i64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: cookies::DEFAULT_REFRESH_COOKIE_NAME.to_owned(),
            max_age_secs: cookies::DEFAULT_REFRESH_COOKIE_MAX_AGE_SECS,
        }
    }
}

/// Revocation store settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationConfig {
    /// Redis URL; in-memory store when unset
    pub redis_url: Option<String>,
    /// Namespace prefix for revocation keys
    pub key_prefix: String,
    /// Behavior when the store cannot answer a revocation check
    pub fail_mode: FailMode,
    /// In-memory expired entry sweep interval
    pub cleanup_interval: StdDuration,
    /// Run the in-memory sweep task
    pub enable_background_cleanup: bool,
    /// Redis connection tuning
    pub redis_connection: RedisConnectionConfig,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: revocation::DEFAULT_KEY_PREFIX.to_owned(),
            fail_mode: FailMode::Closed,
            cleanup_interval: StdDuration::from_secs(revocation::DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
            redis_connection: RedisConnectionConfig::default(),
        }
    }
}

/// Bootstrap account seeded into the in-memory identity store
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrapConfig {
    /// Username
    pub username: String,
    /// Plain password, hashed at startup
    pub password: String,
}

impl fmt::Debug for AdminBootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrapConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Credential lifetimes
    pub tokens: TokenConfig,
    /// Refresh cookie
    pub cookie: CookieConfig,
    /// RSA key files
    pub keys: KeyPaths,
    /// Revocation store
    pub revocation: RevocationConfig,
    /// Optional bootstrap admin
    pub admin: Option<AdminBootstrapConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first; variables
    /// already set in the process environment win over it.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but cannot be parsed
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }
        info!("Loading configuration from environment variables");

        let config = Self {
            host: env_var_or("HOST", ports::DEFAULT_HOST),
            http_port: env_var_or("HTTP_PORT", &ports::DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            tokens: TokenConfig {
                access_ttl_secs: env_var_or(
                    "ACCESS_TOKEN_TTL_SECS",
                    &tokens::DEFAULT_ACCESS_TOKEN_TTL_SECS.to_string(),
                )
                .parse()
                .context("Invalid ACCESS_TOKEN_TTL_SECS value")?,
                refresh_ttl_secs: env_var_or(
                    "REFRESH_TOKEN_TTL_SECS",
                    &tokens::DEFAULT_REFRESH_TOKEN_TTL_SECS.to_string(),
                )
                .parse()
                .context("Invalid REFRESH_TOKEN_TTL_SECS value")?,
            },
            cookie: CookieConfig {
                name: env_var_or("REFRESH_COOKIE_NAME", cookies::DEFAULT_REFRESH_COOKIE_NAME),
                max_age_secs: env_var_or(
                    "REFRESH_COOKIE_MAX_AGE_SECS",
                    &cookies::DEFAULT_REFRESH_COOKIE_MAX_AGE_SECS.to_string(),
                )
                .parse()
                .context("Invalid REFRESH_COOKIE_MAX_AGE_SECS value")?,
            },
            keys: KeyPaths {
                private_key_path: PathBuf::from(env_var_or(
                    "RSA_PRIVATE_KEY_PATH",
                    "./keys/private.pem",
                )),
                public_key_path: PathBuf::from(env_var_or(
                    "RSA_PUBLIC_KEY_PATH",
                    "./keys/public.pem",
                )),
            },
            revocation: RevocationConfig {
                redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
                key_prefix: env_var_or("REVOCATION_KEY_PREFIX", revocation::DEFAULT_KEY_PREFIX),
                fail_mode: env_var_or("REVOCATION_FAIL_MODE", "closed")
                    .parse()
                    .context("Invalid REVOCATION_FAIL_MODE value")?,
                cleanup_interval: StdDuration::from_secs(
                    env_var_or(
                        "REVOCATION_CLEANUP_INTERVAL_SECS",
                        &revocation::DEFAULT_CLEANUP_INTERVAL_SECS.to_string(),
                    )
                    .parse()
                    .context("Invalid REVOCATION_CLEANUP_INTERVAL_SECS value")?,
                ),
                enable_background_cleanup: true,
                redis_connection: RedisConnectionConfig::from_env(),
            },
            admin: admin_from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if lifetimes are non-positive, above [`tokens::MAX_TTL_SECS`] or
    /// inconsistent
    pub fn validate(&self) -> Result<()> {
        check_ttl("ACCESS_TOKEN_TTL_SECS", self.tokens.access_ttl_secs)?;
        check_ttl("REFRESH_TOKEN_TTL_SECS", self.tokens.refresh_ttl_secs)?;
        check_ttl("REFRESH_COOKIE_MAX_AGE_SECS", self.cookie.max_age_secs)?;
        if self.tokens.refresh_ttl_secs < self.tokens.access_ttl_secs {
            bail!("REFRESH_TOKEN_TTL_SECS must not be shorter than ACCESS_TOKEN_TTL_SECS");
        }
        if self.cookie.name.is_empty()
            || !self
                .cookie
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("REFRESH_COOKIE_NAME must be a non-empty token of [A-Za-z0-9_-]");
        }

        if self.revocation.fail_mode == FailMode::Open {
            warn!("REVOCATION_FAIL_MODE=open: revoked tokens are accepted while the revocation store is unreachable");
        }
        if self.revocation.redis_url.is_none() && self.environment.is_production() {
            warn!("REDIS_URL is not set in production: revocations are not shared across instances");
        }
        if self.admin.is_none() {
            warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set: no account can log in");
        }

        Ok(())
    }

    /// Human-readable configuration summary (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Tokenward Configuration:\n\
             - Bind: {}:{}\n\
             - Environment: {}\n\
             - Access TTL: {}s\n\
             - Refresh TTL: {}s\n\
             - Refresh Cookie: {} (max-age {}s)\n\
             - Private Key: {}\n\
             - Public Key: {}\n\
             - Revocation Store: {}\n\
             - Revocation Fail Mode: {}\n\
             - Bootstrap Admin: {}",
            self.host,
            self.http_port,
            self.environment,
            self.tokens.access_ttl_secs,
            self.tokens.refresh_ttl_secs,
            self.cookie.name,
            self.cookie.max_age_secs,
            self.keys.private_key_path.display(),
            self.keys.public_key_path.display(),
            if self.revocation.redis_url.is_some() {
                "Redis"
            } else {
                "In-memory"
            },
            self.revocation.fail_mode,
            self.admin
                .as_ref()
                .map_or("Disabled", |admin| admin.username.as_str()),
        )
    }
}

fn admin_from_env() -> Option<AdminBootstrapConfig> {
    match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
        (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
            Some(AdminBootstrapConfig { username, password })
        }
        (Ok(_), Err(_)) | (Err(_), Ok(_)) => {
            warn!("Only one of ADMIN_USERNAME/ADMIN_PASSWORD is set; bootstrap admin disabled");
            None
        }
        _ => None,
    }
}

fn check_ttl(name: &str, secs: i64) -> Result<()> {
    if secs <= 0 {
        bail!("{name} must be positive");
    }
    if secs > tokens::MAX_TTL_SECS {
        bail!("{name} must not exceed {} seconds", tokens::MAX_TTL_SECS);
    }
    Ok(())
}

fn saturating_seconds(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or(if secs < 0 { Duration::MIN } else { Duration::MAX })
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
