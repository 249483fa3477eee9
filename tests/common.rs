// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides key files, manual clock, identity store and server resource builders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `tokenward`
//!
//! RSA key generation is slow in debug builds, so one key pair is generated per test
//! process and written into a fresh temporary directory for each harness.

use std::env;
use std::fs;
use std::sync::{Arc, Once, OnceLock};

use async_trait::async_trait;
use chrono::Duration;
use tempfile::TempDir;
use tokenward::{
    clock::ManualClock,
    config::environment::{
        CookieConfig, Environment, FailMode, RevocationConfig, ServerConfig, TokenConfig,
    },
    constants::roles,
    identity::InMemoryIdentityStore,
    keys::{generate_pem_pair, GeneratedKeyPair, KeyPaths},
    resources::ServerResources,
    revocation::{memory::InMemoryRevocationStore, RevocationError, RevocationStore},
};
use tracing::Level;

pub const TEST_USER: &str = "alice";
pub const TEST_PASSWORD: &str = "correct horse battery staple";
pub const ADMIN_USER: &str = "root";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Minimum bcrypt cost, keeps password hashing fast in tests
pub const TEST_BCRYPT_COST: u32 = 4;

static INIT_LOGGER: Once = Once::new();
static KEY_PAIR: OnceLock<GeneratedKeyPair> = OnceLock::new();
static OTHER_KEY_PAIR: OnceLock<GeneratedKeyPair> = OnceLock::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Key pair shared by every test in the process
pub fn key_pair() -> &'static GeneratedKeyPair {
    KEY_PAIR.get_or_init(|| generate_pem_pair(2048).expect("Failed to generate RSA key pair"))
}

/// A second, unrelated key pair for wrong-key tests
pub fn other_key_pair() -> &'static GeneratedKeyPair {
    OTHER_KEY_PAIR.get_or_init(|| generate_pem_pair(2048).expect("Failed to generate RSA key pair"))
}

/// Write a key pair to `private.pem` / `public.pem` in a new temporary directory
pub fn write_key_files(pair: &GeneratedKeyPair) -> (TempDir, KeyPaths) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let paths = KeyPaths {
        private_key_path: dir.path().join("private.pem"),
        public_key_path: dir.path().join("public.pem"),
    };
    fs::write(&paths.private_key_path, &pair.private_pem).expect("Failed to write private key");
    fs::write(&paths.public_key_path, &pair.public_pem).expect("Failed to write public key");
    (dir, paths)
}

/// Configuration with default lifetimes and the given key files
pub fn test_config(keys: KeyPaths) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        environment: Environment::Testing,
        tokens: TokenConfig::default(),
        cookie: CookieConfig::default(),
        keys,
        revocation: RevocationConfig {
            enable_background_cleanup: false,
            ..RevocationConfig::default()
        },
        admin: None,
    }
}

/// Identity store holding [`TEST_USER`] and [`ADMIN_USER`]
pub async fn create_test_identities() -> Arc<InMemoryIdentityStore> {
    let store = InMemoryIdentityStore::with_cost(TEST_BCRYPT_COST);
    store
        .add_user(TEST_USER, TEST_PASSWORD, vec![roles::USER.to_owned()])
        .await
        .expect("Failed to add test user");
    store
        .add_user(
            ADMIN_USER,
            ADMIN_PASSWORD,
            vec![roles::ADMIN.to_owned(), roles::USER.to_owned()],
        )
        .await
        .expect("Failed to add admin user");
    Arc::new(store)
}

/// Everything an integration test needs, with handles on the test doubles
pub struct TestHarness {
    pub resources: Arc<ServerResources>,
    pub clock: Arc<ManualClock>,
    pub revocation: Arc<dyn RevocationStore>,
    pub identities: Arc<InMemoryIdentityStore>,
    pub config: ServerConfig,
    _key_dir: TempDir,
}

impl TestHarness {
    /// Harness over an in-memory revocation store
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Harness with configuration tweaks applied before wiring
    pub async fn with_config(tweak: impl FnOnce(&mut ServerConfig)) -> Self {
        init_test_logging();
        let clock = Arc::new(ManualClock::starting_now());
        let (key_dir, paths) = write_key_files(key_pair());
        let mut config = test_config(paths);
        tweak(&mut config);

        let revocation: Arc<dyn RevocationStore> = Arc::new(InMemoryRevocationStore::new(
            &config.revocation,
            clock.clone(),
        ));
        Self::assemble(config, clock, revocation, key_dir).await
    }

    /// Harness over a caller-supplied revocation store
    pub async fn with_store(
        revocation: Arc<dyn RevocationStore>,
        tweak: impl FnOnce(&mut ServerConfig),
    ) -> Self {
        init_test_logging();
        let clock = Arc::new(ManualClock::starting_now());
        let (key_dir, paths) = write_key_files(key_pair());
        let mut config = test_config(paths);
        tweak(&mut config);
        Self::assemble(config, clock, revocation, key_dir).await
    }

    async fn assemble(
        config: ServerConfig,
        clock: Arc<ManualClock>,
        revocation: Arc<dyn RevocationStore>,
        key_dir: TempDir,
    ) -> Self {
        let identities = create_test_identities().await;
        let resources = Arc::new(ServerResources::new(
            config.clone(),
            clock.clone(),
            revocation.clone(),
            identities.clone(),
        ));

        Self {
            resources,
            clock,
            revocation,
            identities,
            config,
            _key_dir: key_dir,
        }
    }
}

/// Revocation store whose every call fails, for fail-mode tests
#[derive(Debug, Default)]
pub struct UnavailableRevocationStore;

#[async_trait]
impl RevocationStore for UnavailableRevocationStore {
    async fn revoke(&self, _token: &str, _ttl: Duration) -> Result<(), RevocationError> {
        Err(RevocationError::StoreUnavailable("connection refused".into()))
    }

    async fn revoke_once(&self, _token: &str, _ttl: Duration) -> Result<bool, RevocationError> {
        Err(RevocationError::StoreUnavailable("connection refused".into()))
    }

    async fn is_revoked(&self, _token: &str) -> Result<bool, RevocationError> {
        Err(RevocationError::StoreUnavailable("connection refused".into()))
    }

    async fn health_check(&self) -> Result<(), RevocationError> {
        Err(RevocationError::StoreUnavailable("connection refused".into()))
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Fail mode shortcut for harness tweaks
pub fn fail_open(config: &mut ServerConfig) {
    config.revocation.fail_mode = FailMode::Open;
}
