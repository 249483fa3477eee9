// ABOUTME: HTTP security helpers shared by routes and middleware
// ABOUTME: Refresh cookie parsing and Set-Cookie construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Cookie parsing and `Set-Cookie` builders
pub mod cookies;
