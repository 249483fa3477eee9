// ABOUTME: Main library entry point for the tokenward session and token lifecycle service
// ABOUTME: Exposes key loading, token codec, revocation, sessions and the HTTP pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Tokenward
//!
//! Stateless JWT sessions with server-side revocation.
//!
//! A client logs in with a username and password and receives a short-lived RS256 access
//! credential in the response body and a long-lived refresh credential in an `HttpOnly`
//! cookie. Every refresh rotates the pair and revokes the refresh credential it consumed;
//! logout revokes both. Revocation records live in Redis (or an in-process map for
//! single-instance deployments) and expire with the credential they describe.
//!
//! ## Architecture
//!
//! - **Keys**: lazy, cached loading of the PKCS#8 private / SPKI public key pair
//! - **Tokens**: signing, verification and claim extraction
//! - **Revocation**: the blacklist, keyed by a digest of the credential
//! - **Session**: login, refresh rotation and logout
//! - **Middleware**: the request authentication pipeline
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokenward::config::environment::ServerConfig;
//! use tokenward::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let resources = Arc::new(ServerResources::from_config(config).await?);
//!     tokenward::server::run(resources).await
//! }
//! ```

/// Time source for token issuance and expiry checks
pub mod clock;

/// Environment-driven configuration
pub mod config;

/// Users, roles and password verification
pub mod identity;

/// RSA key pair loading and caching
pub mod keys;

/// Structured logging setup and auth/security event helpers
pub mod logging;

/// HTTP middleware: authentication pipeline and request tracing
pub mod middleware;

/// Shared server resources
pub mod resources;

/// Revocation store trait and backends
pub mod revocation;

/// HTTP route handlers
pub mod routes;

/// Cookie helpers
pub mod security;

/// HTTP server assembly
pub mod server;

/// Login, refresh-token rotation and logout
pub mod session;

/// JWT issuance and verification
pub mod tokens;

pub use tokenward_core::{constants, errors};
