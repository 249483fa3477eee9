// ABOUTME: Request tracing spans for correlation and structured logging
// ABOUTME: Creates one span per HTTP request carrying request ID, user and auth method fields

use axum::http::Request;
use tracing::field::Empty;
use tracing::{info_span, Span};

/// Header carrying the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create a tracing span for an HTTP request
///
/// `user_id` and `auth_method` are filled in by the authentication middleware.
pub fn create_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        user_id = Empty,
        auth_method = Empty,
    )
}
