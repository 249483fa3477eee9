// ABOUTME: Route module organization for the tokenward HTTP endpoints
// ABOUTME: Groups session routes and health probes, each exposing a Router builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! HTTP routes
//!
//! Each domain module contains only route definitions and thin handler functions that
//! delegate to the session service and revocation store.

/// Login, refresh-token rotation, logout and identity routes
pub mod auth;
/// Liveness and readiness probes
pub mod health;

pub use auth::AuthRoutes;
pub use health::HealthRoutes;
