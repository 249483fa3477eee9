// ABOUTME: Request and response types for authentication routes
// ABOUTME: Defines DTOs for login, token issuance and identity endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Authentication request and response types

use std::fmt;

use serde::{Deserialize, Serialize};
use tokenward_core::constants::tokens::RESPONSE_TOKEN_TYPE;

use crate::identity::Identity;
use crate::session::IssuedSession;

/// User login request
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body returned by login and refresh; the refresh credential travels in a cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Bearer credential
    pub access_token: String,
    /// Always `access_token`
    pub token_type: String,
    /// Access credential lifetime in seconds
    pub expires_in_seconds: i64,
}

impl From<&IssuedSession> for TokenResponse {
    fn from(session: &IssuedSession) -> Self {
        Self {
            access_token: session.access_token.clone(),
            token_type: RESPONSE_TOKEN_TYPE.to_owned(),
            expires_in_seconds: session.expires_in_secs,
        }
    }
}

/// Current identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// Username
    pub subject: String,
    /// Roles
    pub roles: Vec<String>,
}

impl From<Identity> for MeResponse {
    fn from(identity: Identity) -> Self {
        Self {
            subject: identity.subject,
            roles: identity.roles,
        }
    }
}
