// ABOUTME: Request authentication pipeline: exemption, revocation stage, verification stage
// ABOUTME: Binds the resolved Identity into request extensions for downstream handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Request Authentication Pipeline
//!
//! Every request passes through [`authentication_middleware`]:
//!
//! 1. Exempt paths (login, refresh, health probes, docs) bypass everything.
//! 2. A revoked bearer credential is rejected with `TOKEN_BLACKLISTED` before any signature
//!    work is done. A store outage is handled according to the configured fail mode.
//! 3. Requests without a bearer credential, or that already carry an [`Identity`], continue
//!    unauthenticated. Otherwise the credential is verified, must be an access credential,
//!    and its subject must still exist; the resulting [`Identity`] is inserted into the
//!    request extensions.
//!
//! Handlers that need a caller take [`Identity`] as an extractor, which rejects with
//! `AUTH_REQUIRED` when the pipeline did not bind one.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokenward_core::constants::endpoints::AUTH_EXEMPT_PREFIXES;
use tokenward_core::constants::tokens::BEARER_PREFIX;
use tokenward_core::errors::AppError;
use tracing::{debug, warn, Span};

use crate::config::environment::FailMode;
use crate::identity::Identity;
use crate::logging::{AppLogger, Severity};
use crate::resources::ServerResources;
use crate::revocation::fingerprint;
use crate::session::verification_error;
use crate::tokens::TokenKind;

/// Whether `path` bypasses request authentication
#[must_use]
pub fn is_exempt(path: &str) -> bool {
    AUTH_EXEMPT_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Credential from an `Authorization: Bearer <token>` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let token = value.get(BEARER_PREFIX.len()..)?.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

/// Authentication middleware
///
/// # Example
///
/// ```rust,no_run
/// use axum::{middleware, routing::get, Router};
/// use std::sync::Arc;
/// use tokenward::identity::Identity;
/// use tokenward::middleware::auth::authentication_middleware;
/// use tokenward::resources::ServerResources;
///
/// async fn whoami(identity: Identity) -> String {
///     identity.subject
/// }
///
/// # fn example(resources: Arc<ServerResources>) {
/// let app: Router = Router::new()
///     .route("/api/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(resources, authentication_middleware));
/// # }
/// ```
pub async fn authentication_middleware(
    State(resources): State<Arc<ServerResources>>,
    mut req: Request,
    next: Next,
) -> Response {
    if is_exempt(req.uri().path()) {
        return next.run(req).await;
    }

    let bearer = bearer_token(req.headers());

    if let Some(token) = &bearer {
        if let Err(rejection) = revocation_stage(&resources, token).await {
            return rejection.into_response();
        }
    }

    let Some(token) = bearer else {
        debug!("No bearer token, continuing unauthenticated");
        return next.run(req).await;
    };

    if req.extensions().get::<Identity>().is_some() {
        return next.run(req).await;
    }

    match verification_stage(&resources, &token).await {
        Ok(identity) => {
            Span::current()
                .record("user_id", identity.subject.as_str())
                .record("auth_method", "BEARER");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(rejection) => {
            Span::current().record("auth_method", "BEARER_REJECTED");
            rejection.into_response()
        }
    }
}

/// Reject revoked credentials; store outages follow the fail mode
async fn revocation_stage(resources: &ServerResources, token: &str) -> Result<(), AppError> {
    match resources.revocation.is_revoked(token).await {
        Ok(false) => Ok(()),
        Ok(true) => {
            AppLogger::log_security_event(
                "revoked_token_presented",
                Severity::Medium,
                &format!("revoked bearer token presented ({})", fingerprint(token)),
                None,
            );
            Err(AppError::token_blacklisted())
        }
        Err(e) => match resources.config.revocation.fail_mode {
            FailMode::Closed => {
                AppLogger::log_security_event(
                    "revocation_store_unavailable",
                    Severity::High,
                    &format!("rejecting request, fail mode closed: {e}"),
                    None,
                );
                Err(AppError::from(e))
            }
            FailMode::Open => {
                warn!(error = %e, "Revocation store unavailable, skipping revocation check (fail mode open)");
                Ok(())
            }
        },
    }
}

/// Verify the credential and resolve its subject
async fn verification_stage(resources: &ServerResources, token: &str) -> Result<Identity, AppError> {
    let claims = resources
        .token_codec
        .verify(token)
        .await
        .map_err(verification_error)?;

    if claims.kind != TokenKind::Access {
        warn!(sub = %claims.sub, kind = %claims.kind, "Non-access token presented as bearer");
        return Err(AppError::token_invalid("Access token required"));
    }

    resources
        .identities
        .find(&claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(sub = %claims.sub, "Bearer token subject no longer exists");
            AppError::token_invalid("Token subject is unknown")
        })
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(AppError::auth_required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_exempt_paths() {
        assert!(is_exempt("/auth/login"));
        assert!(is_exempt("/auth/refresh-token"));
        assert!(is_exempt("/swagger-ui/index.html"));
        assert!(is_exempt("/health"));
        assert!(!is_exempt("/auth/logout"));
        assert!(!is_exempt("/auth/me"));
        assert!(!is_exempt("/api/widgets"));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer  abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearerabc"));
        assert!(bearer_token(&headers).is_none());
    }
}
