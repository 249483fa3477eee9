// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Environment-driven server, token, cookie, key and revocation configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration module
//!
//! All configuration comes from environment variables; there is no config file.

/// Environment and server configuration
pub mod environment;
/// Redis connection tuning
pub mod redis;
