// ABOUTME: Unified error handling with standard error codes and HTTP status mapping
// ABOUTME: Defines AppError, ErrorCode and the JSON error body returned to clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Unified Error Handling System
//!
//! Every failure that reaches an HTTP client is an [`AppError`]. The error code decides the
//! status; the message is a short client-facing text. Internal detail lives in `source` and
//! is only ever logged.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes used throughout the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// No authenticated identity on a protected route
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    /// Username/password rejected
    #[serde(rename = "INVALID_CREDENTIALS")]
    InvalidCredentials = 1001,
    /// Credential signature valid but `exp` has passed
    #[serde(rename = "TOKEN_EXPIRED")]
    TokenExpired = 1002,
    /// Credential signature mismatch, malformed, or wrong kind
    #[serde(rename = "INVALID_TOKEN")]
    TokenInvalid = 1003,
    /// Credential present in the revocation store
    #[serde(rename = "TOKEN_BLACKLISTED")]
    TokenBlacklisted = 1004,
    /// Refresh endpoint called without the refresh cookie
    #[serde(rename = "REFRESH_TOKEN_MISSING")]
    RefreshTokenMissing = 1005,
    /// Revocation store unreachable while failing closed
    #[serde(rename = "STORE_UNAVAILABLE")]
    StoreUnavailable = 1006,
    /// Authenticated but not allowed
    #[serde(rename = "PERMISSION_DENIED")]
    PermissionDenied = 1100,

    // Validation (3000-3999)
    /// Request body or parameters could not be understood
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Configuration (6000-6999)
    /// Configuration is missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    /// Credential could not be signed
    #[serde(rename = "ISSUANCE_FAILED")]
    IssuanceFailed = 9000,
    /// Anything else
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9999,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidInput => 400,

            // 401 Unauthorized; store outages fail closed
            Self::AuthRequired
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::TokenBlacklisted
            | Self::RefreshTokenMissing
            | Self::StoreUnavailable => 401,

            // 403 Forbidden
            Self::PermissionDenied => 403,

            // 500 Internal Server Error
            Self::IssuanceFailed | Self::ConfigError | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::InvalidCredentials => "The provided username or password is incorrect",
            Self::TokenExpired => "The token has expired",
            Self::TokenInvalid => "The token is invalid",
            Self::TokenBlacklisted => "The token has been revoked",
            Self::RefreshTokenMissing => "Refresh token is missing",
            Self::StoreUnavailable => "Token revocation status could not be determined",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::InvalidInput => "The provided input is invalid",
            Self::ConfigError => "Configuration error encountered",
            Self::IssuanceFailed => "Token issuance failed",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde names are the wire codes
        let code = match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "INVALID_TOKEN",
            Self::TokenBlacklisted => "TOKEN_BLACKLISTED",
            Self::RefreshTokenMissing => "REFRESH_TOKEN_MISSING",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IssuanceFailed => "ISSUANCE_FAILED",
            Self::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(code)
    }
}

/// Unified error type for the service
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Short, client-facing message
    pub message: String,
    /// Source error for error chaining (never sent to clients)
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Short text
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
            },
        }
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Bad username or password
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid username or password")
    }

    /// Credential expired
    #[must_use]
    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired, "Token has expired")
    }

    /// Credential invalid for any reason other than expiry or revocation
    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenInvalid, message)
    }

    /// Credential has been revoked
    #[must_use]
    pub fn token_blacklisted() -> Self {
        Self::new(ErrorCode::TokenBlacklisted, "Token has been revoked")
    }

    /// No refresh credential on the request
    #[must_use]
    pub fn refresh_token_missing() -> Self {
        Self::new(ErrorCode::RefreshTokenMissing, "Refresh token is missing")
    }

    /// Revocation store unreachable
    #[must_use]
    pub fn store_unavailable() -> Self {
        Self::new(
            ErrorCode::StoreUnavailable,
            "Token revocation status unavailable",
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Signing failure
    #[must_use]
    pub fn issuance_failed() -> Self {
        Self::new(ErrorCode::IssuanceFailed, "Token issuance failed")
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use http::StatusCode;
    use tracing::{error, warn};

    use super::{AppError, ErrorResponse};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            let source = self
                .source
                .as_ref()
                .map_or_else(String::new, ToString::to_string);
            if status.is_server_error() {
                error!(code = %self.code, source = %source, "{}", self.message);
            } else {
                warn!(code = %self.code, source = %source, "{}", self.message);
            }

            (status, Json(ErrorResponse::from(self))).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::AuthRequired.http_status(), 401);
        assert_eq!(ErrorCode::TokenBlacklisted.http_status(), 401);
        assert_eq!(ErrorCode::StoreUnavailable.http_status(), 401);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::IssuanceFailed.http_status(), 500);
    }

    #[test]
    fn test_display_matches_wire_code() {
        for code in [
            ErrorCode::TokenExpired,
            ErrorCode::TokenInvalid,
            ErrorCode::TokenBlacklisted,
            ErrorCode::StoreUnavailable,
        ] {
            let wire = serde_json::to_value(code).unwrap();
            assert_eq!(wire.as_str().unwrap(), code.to_string());
        }
    }

    #[test]
    fn test_error_response_hides_source() {
        let error = AppError::issuance_failed()
            .with_source(std::io::Error::other("private key file unreadable"));
        let json = serde_json::to_string(&ErrorResponse::from(error)).unwrap();

        assert!(json.contains("ISSUANCE_FAILED"));
        assert!(!json.contains("private key"));
    }
}
