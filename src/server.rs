// ABOUTME: HTTP server assembly: router composition, middleware stack and serve loop
// ABOUTME: Wires routes, the authentication pipeline and request-id tracing layers onto axum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! HTTP server
//!
//! Layers, outermost first:
//!
//! 1. request ID assignment (`x-request-id`, generated when absent)
//! 2. request ID propagation onto the response
//! 3. per-request tracing span
//! 4. authentication pipeline

use std::future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{body::Body, middleware, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::environment::ServerConfig;
use crate::middleware::{authentication_middleware, create_request_span};
use crate::resources::ServerResources;
use crate::routes::{AuthRoutes, HealthRoutes};

/// Build the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    build_router_with(resources, Router::new())
}

/// Build the application router with additional application routes
///
/// Routes in `extra` sit behind the same authentication pipeline as `/auth/*`, so handlers
/// there can take [`Identity`](crate::identity::Identity) as an extractor.
pub fn build_router_with(resources: Arc<ServerResources>, extra: Router) -> Router {
    Router::new()
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(extra)
        .layer(middleware::from_fn_with_state(
            resources,
            authentication_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(create_request_span::<Body>)),
        )
}

/// Run the HTTP server until Ctrl+C
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails while serving
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    let config: &ServerConfig = &resources.config;
    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.http_port))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);

    let app = build_router(resources);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler, serving until killed");
        future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}
