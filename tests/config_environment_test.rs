// ABOUTME: Unit tests for environment-driven server configuration
// ABOUTME: Validates defaults, overrides, fail mode parsing and validation errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use serial_test::serial;
use tokenward::config::environment::{Environment, FailMode, ServerConfig, TokenConfig};
use tokenward_core::constants::tokens::MAX_TTL_SECS;

const VARS: &[&str] = &[
    "HOST",
    "HTTP_PORT",
    "ENVIRONMENT",
    "ACCESS_TOKEN_TTL_SECS",
    "REFRESH_TOKEN_TTL_SECS",
    "REFRESH_COOKIE_NAME",
    "REFRESH_COOKIE_MAX_AGE_SECS",
    "RSA_PRIVATE_KEY_PATH",
    "RSA_PUBLIC_KEY_PATH",
    "REDIS_URL",
    "REVOCATION_KEY_PREFIX",
    "REVOCATION_FAIL_MODE",
    "REVOCATION_CLEANUP_INTERVAL_SECS",
    "ADMIN_USERNAME",
    "ADMIN_PASSWORD",
];

/// Run `f` with exactly the given variables set, restoring a clean slate afterwards
fn with_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
    for key in VARS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }
    let result = f();
    for key in VARS {
        env::remove_var(key);
    }
    result
}

#[test]
fn test_environment_parsing() {
    assert_eq!(
        Environment::from_str_or_default("production"),
        Environment::Production
    );
    assert_eq!(
        Environment::from_str_or_default("PROD"),
        Environment::Production
    );
    assert_eq!(
        Environment::from_str_or_default("test"),
        Environment::Testing
    );
    assert_eq!(
        Environment::from_str_or_default("invalid"),
        Environment::Development
    ); // Default fallback
}

#[test]
fn test_fail_mode_parsing() {
    assert_eq!("closed".parse::<FailMode>().unwrap(), FailMode::Closed);
    assert_eq!(" OPEN ".parse::<FailMode>().unwrap(), FailMode::Open);
    assert!("sometimes".parse::<FailMode>().is_err());
    assert_eq!(FailMode::default(), FailMode::Closed);
}

#[test]
#[serial]
fn test_defaults() {
    let config = with_env(&[], ServerConfig::from_env).unwrap();

    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.tokens.access_ttl_secs, 900);
    assert_eq!(config.tokens.refresh_ttl_secs, 604_800);
    assert_eq!(config.cookie.name, "REFRESH_TOKEN");
    assert_eq!(config.cookie.max_age_secs, 604_800);
    assert_eq!(
        config.keys.private_key_path,
        PathBuf::from("./keys/private.pem")
    );
    assert_eq!(config.keys.public_key_path, PathBuf::from("./keys/public.pem"));
    assert!(config.revocation.redis_url.is_none());
    assert_eq!(config.revocation.key_prefix, "tokenward:revoked:");
    assert_eq!(config.revocation.fail_mode, FailMode::Closed);
    assert_eq!(config.revocation.cleanup_interval, StdDuration::from_secs(60));
    assert!(config.admin.is_none());
}

#[test]
#[serial]
fn test_overrides() {
    let config = with_env(
        &[
            ("HTTP_PORT", "9090"),
            ("ENVIRONMENT", "production"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("REFRESH_TOKEN_TTL_SECS", "3600"),
            ("REFRESH_COOKIE_NAME", "rt"),
            ("RSA_PRIVATE_KEY_PATH", "/etc/tokenward/private.pem"),
            ("REDIS_URL", "redis://cache:6379"),
            ("REVOCATION_FAIL_MODE", "open"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "hunter2"),
        ],
        ServerConfig::from_env,
    )
    .unwrap();

    assert_eq!(config.http_port, 9090);
    assert!(config.environment.is_production());
    assert_eq!(config.tokens.access_ttl_secs, 60);
    assert_eq!(config.tokens.refresh_ttl_secs, 3600);
    assert_eq!(config.cookie.name, "rt");
    assert_eq!(
        config.keys.private_key_path,
        PathBuf::from("/etc/tokenward/private.pem")
    );
    assert_eq!(
        config.revocation.redis_url.as_deref(),
        Some("redis://cache:6379")
    );
    assert_eq!(config.revocation.fail_mode, FailMode::Open);
    assert_eq!(config.admin.as_ref().unwrap().username, "root");
}

#[test]
#[serial]
fn test_blank_redis_url_means_in_memory() {
    let config = with_env(&[("REDIS_URL", "  ")], ServerConfig::from_env).unwrap();
    assert!(config.revocation.redis_url.is_none());
}

#[test]
#[serial]
fn test_admin_requires_both_variables() {
    let config = with_env(&[("ADMIN_USERNAME", "root")], ServerConfig::from_env).unwrap();
    assert!(config.admin.is_none());
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    let cases: &[(&str, &str)] = &[
        ("HTTP_PORT", "eighty"),
        ("ACCESS_TOKEN_TTL_SECS", "0"),
        ("REFRESH_TOKEN_TTL_SECS", "-1"),
        ("REFRESH_COOKIE_MAX_AGE_SECS", "0"),
        ("REFRESH_COOKIE_NAME", "bad name;"),
        ("REFRESH_TOKEN_TTL_SECS", "100000000000000000"),
        ("ACCESS_TOKEN_TTL_SECS", "31536001"),
        ("REFRESH_COOKIE_MAX_AGE_SECS", "9223372036854775807"),
        ("REVOCATION_FAIL_MODE", "maybe"),
    ];

    for (key, value) in cases {
        let result = with_env(&[(key, value)], ServerConfig::from_env);
        assert!(result.is_err(), "{key}={value} should be rejected");
    }
}

#[test]
#[serial]
fn test_refresh_must_outlive_access() {
    let result = with_env(
        &[
            ("ACCESS_TOKEN_TTL_SECS", "3600"),
            ("REFRESH_TOKEN_TTL_SECS", "60"),
        ],
        ServerConfig::from_env,
    );
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_summary_hides_admin_password() {
    let config = with_env(
        &[("ADMIN_USERNAME", "root"), ("ADMIN_PASSWORD", "hunter2")],
        ServerConfig::from_env,
    )
    .unwrap();

    let summary = config.summary();
    assert!(summary.contains("root"));
    assert!(!summary.contains("hunter2"));
    assert!(!format!("{config:?}").contains("hunter2"));
}

#[test]
#[serial]
fn test_lifetime_upper_bound() {
    let ceiling = MAX_TTL_SECS.to_string();
    let config = with_env(
        &[
            ("ACCESS_TOKEN_TTL_SECS", "900"),
            ("REFRESH_TOKEN_TTL_SECS", &ceiling),
            ("REFRESH_COOKIE_MAX_AGE_SECS", &ceiling),
        ],
        ServerConfig::from_env,
    )
    .unwrap();
    assert_eq!(config.tokens.refresh_ttl().num_seconds(), MAX_TTL_SECS);

    let err = with_env(
        &[("REFRESH_TOKEN_TTL_SECS", "100000000000000000")],
        ServerConfig::from_env,
    )
    .unwrap_err();
    assert!(err.to_string().contains("REFRESH_TOKEN_TTL_SECS"), "{err}");
}

#[test]
fn test_out_of_range_lifetimes_saturate() {
    let tokens = TokenConfig {
        access_ttl_secs: i64::MAX,
        refresh_ttl_secs: i64::MIN,
    };
    assert!(tokens.access_ttl() > chrono::Duration::days(365));
    assert!(tokens.refresh_ttl() < chrono::Duration::zero());
}

#[test]
#[serial]
fn test_dotenv_file_fills_unset_variables() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "ACCESS_TOKEN_TTL_SECS=120\nREFRESH_COOKIE_NAME=from_dotenv\n",
    )
    .unwrap();
    let previous = env::current_dir().unwrap();
    env::set_current_dir(dir.path()).unwrap();

    let result = with_env(&[("REFRESH_COOKIE_NAME", "from_process")], ServerConfig::from_env);
    env::set_current_dir(previous).unwrap();

    let config = result.unwrap();
    assert_eq!(config.tokens.access_ttl_secs, 120);
    assert_eq!(config.cookie.name, "from_process");
}
