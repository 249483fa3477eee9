// ABOUTME: Session route handlers for login, refresh-token rotation, logout and identity lookup
// ABOUTME: Translates HTTP requests into SessionService calls and sets or clears the refresh cookie
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Authentication routes
//!
//! - `POST /auth/login` - exchange username/password for an access credential and refresh cookie
//! - `POST /auth/refresh-token` - rotate the refresh cookie into a fresh pair
//! - `POST /auth/logout` - revoke the bearer credential and the refresh cookie
//! - `GET /auth/me` - return the authenticated identity
//!
//! Handlers stay thin: all lifecycle rules live in [`SessionService`](crate::session::SessionService).

pub mod types;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokenward_core::constants::endpoints;
use tokenward_core::errors::AppError;
use tracing::debug;

use crate::identity::Identity;
use crate::middleware::auth::bearer_token;
use crate::resources::ServerResources;
use crate::security::cookies::{clear_refresh_cookie, get_cookie_value, refresh_cookie};
use crate::session::IssuedSession;

use self::types::{LoginRequest, MeResponse, TokenResponse};

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(endpoints::LOGIN, post(Self::handle_login))
            .route(endpoints::REFRESH_TOKEN, post(Self::handle_refresh))
            .route(endpoints::LOGOUT, post(Self::handle_logout))
            .route(endpoints::ME, get(Self::handle_me))
            .with_state(resources)
    }

    /// Handle user login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<LoginRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let Json(request) = payload.map_err(|rejection| {
            debug!(error = %rejection, "Rejected login body");
            AppError::invalid_input("Request body must be JSON with username and password")
        })?;

        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::invalid_input("username and password are required"));
        }

        let session = resources
            .sessions
            .login(&request.username, &request.password)
            .await?;

        Self::session_response(&resources, &session)
    }

    /// Handle refresh-token rotation
    async fn handle_refresh(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let cookie_name = &resources.config.cookie.name;
        let presented =
            get_cookie_value(&headers, cookie_name).ok_or_else(AppError::refresh_token_missing)?;

        let session = resources.sessions.refresh(&presented).await?;

        Self::session_response(&resources, &session)
    }

    /// Handle logout
    async fn handle_logout(
        State(resources): State<Arc<ServerResources>>,
        identity: Identity,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let access = bearer_token(&headers);
        let refresh = get_cookie_value(&headers, &resources.config.cookie.name);

        let outcome = resources
            .sessions
            .logout(access.as_deref(), refresh.as_deref())
            .await?;
        debug!(
            user_id = %identity.subject,
            access_revoked = outcome.access_revoked,
            refresh_revoked = outcome.refresh_revoked,
            "Logout complete"
        );

        let cleared = clear_refresh_cookie(&resources.config.cookie.name).map_err(|e| {
            AppError::internal("Failed to build refresh cookie").with_source(e)
        })?;

        Ok(Self::with_cookie(StatusCode::NO_CONTENT.into_response(), cleared))
    }

    /// Handle identity lookup
    async fn handle_me(identity: Identity) -> Json<MeResponse> {
        Json(MeResponse::from(identity))
    }

    /// `200` with the token body and the refresh cookie
    fn session_response(
        resources: &ServerResources,
        session: &IssuedSession,
    ) -> Result<Response, AppError> {
        let cookie = &resources.config.cookie;
        let set_cookie = refresh_cookie(&cookie.name, &session.refresh_token, cookie.max_age_secs)
            .map_err(|e| AppError::internal("Failed to build refresh cookie").with_source(e))?;

        let body = Json(TokenResponse::from(session));
        Ok(Self::with_cookie(
            (StatusCode::OK, body).into_response(),
            set_cookie,
        ))
    }

    fn with_cookie(mut response: Response, cookie: HeaderValue) -> Response {
        response.headers_mut().append(SET_COOKIE, cookie);
        response
    }
}
