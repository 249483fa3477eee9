// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Token lifetimes, cookie attributes, revocation keys and route paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants module

/// Token lifetime defaults (seconds)
pub mod tokens {
    /// Access credential lifetime (15 minutes)
    pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 900;
    /// Refresh credential lifetime (7 days)
    pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 604_800;
    /// Upper bound for any configured lifetime or cookie Max-Age (365 days)
    pub const MAX_TTL_SECS: i64 = 31_536_000;
    /// `type` claim value for access credentials
    pub const ACCESS_TOKEN_TYPE: &str = "access_token";
    /// `type` claim value for refresh credentials
    pub const REFRESH_TOKEN_TYPE: &str = "refresh_token";
    /// Value of `tokenType` in login/refresh responses
    pub const RESPONSE_TOKEN_TYPE: &str = "access_token";
    /// Authorization scheme prefix
    pub const BEARER_PREFIX: &str = "Bearer ";
}

/// Refresh cookie defaults
pub mod cookies {
    /// Cookie carrying the refresh credential
    pub const DEFAULT_REFRESH_COOKIE_NAME: &str = "REFRESH_TOKEN";
    /// Cookie Max-Age (7 days)
    pub const DEFAULT_REFRESH_COOKIE_MAX_AGE_SECS: i64 = 604_800;
    /// Cookie path
    pub const COOKIE_PATH: &str = "/";
}

/// Revocation store defaults
pub mod revocation {
    /// Namespace for revocation keys in shared stores
    pub const DEFAULT_KEY_PREFIX: &str = "tokenward:revoked:";
    /// In-memory cleanup interval
    pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;
    /// Length of the credential fingerprint written to logs
    pub const LOG_FINGERPRINT_LEN: usize = 12;
}

/// Redis connection defaults
pub mod redis {
    /// Connection timeout
    pub const CONNECTION_TIMEOUT_SECS: u64 = 5;
    /// Per-command response timeout
    pub const RESPONSE_TIMEOUT_SECS: u64 = 2;
    /// Reconnection retries after a dropped connection
    pub const RECONNECTION_RETRIES: usize = 3;
    /// Exponential backoff base
    pub const RETRY_EXPONENT_BASE: u64 = 2;
    /// Backoff cap
    pub const MAX_RETRY_DELAY_MS: u64 = 5000;
    /// Startup connection retries
    pub const INITIAL_CONNECTION_RETRIES: u32 = 3;
    /// Startup retry delay (doubles each attempt)
    pub const INITIAL_RETRY_DELAY_MS: u64 = 200;
}

/// Route paths
pub mod endpoints {
    /// Login
    pub const LOGIN: &str = "/auth/login";
    /// Refresh-token rotation
    pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
    /// Logout
    pub const LOGOUT: &str = "/auth/logout";
    /// Current identity
    pub const ME: &str = "/auth/me";
    /// Liveness
    pub const HEALTH: &str = "/health";
    /// Readiness
    pub const READY: &str = "/ready";

    /// Prefixes that bypass request authentication entirely
    pub const AUTH_EXEMPT_PREFIXES: &[&str] = &[
        LOGIN,
        REFRESH_TOKEN,
        HEALTH,
        READY,
        "/error",
        "/swagger-ui",
        "/v3/api-docs",
    ];
}

/// Network defaults
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
    /// Default bind host
    pub const DEFAULT_HOST: &str = "0.0.0.0";
}

/// Service identity for logs
pub mod service_names {
    /// Server binary name
    pub const TOKENWARD_SERVER: &str = "tokenward-server";
}

/// Role names
pub mod roles {
    /// Administrator
    pub const ADMIN: &str = "ADMIN";
    /// Regular user
    pub const USER: &str = "USER";
}
