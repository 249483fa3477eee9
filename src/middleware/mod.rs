// ABOUTME: HTTP middleware for request authentication and tracing
// ABOUTME: Provides the authentication pipeline and per-request span creation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Request authentication pipeline and `Identity` extractor
pub mod auth;

/// Request span creation
pub mod tracing;

pub use auth::{authentication_middleware, bearer_token, is_exempt};
pub use self::tracing::create_request_span;
