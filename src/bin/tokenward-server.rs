// ABOUTME: Server binary for the tokenward session and token lifecycle service
// ABOUTME: Loads configuration from the environment, wires resources and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Tokenward Server Binary
//!
//! Starts the HTTP API exposing login, refresh-token rotation, logout and health probes.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokenward::{
    config::environment::ServerConfig, logging, resources::ServerResources, server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tokenward-server")]
#[command(about = "Tokenward - JWT session issuance, rotation and revocation")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override bind host
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    info!("Starting Tokenward");
    info!("{}", config.summary());

    let resources = Arc::new(ServerResources::from_config(config).await?);
    display_available_endpoints(&resources);

    if let Err(e) = server::run(resources).await {
        error!("Server error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Display the available API endpoints
#[allow(clippy::cognitive_complexity)]
fn display_available_endpoints(resources: &ServerResources) {
    let host = &resources.config.host;
    let port = resources.config.http_port;

    info!("=== Available API Endpoints ===");
    info!("   Login:         POST http://{host}:{port}/auth/login");
    info!("   Refresh Token: POST http://{host}:{port}/auth/refresh-token");
    info!("   Logout:        POST http://{host}:{port}/auth/logout");
    info!("   Current User:  GET  http://{host}:{port}/auth/me");
    info!("   Health:        GET  http://{host}:{port}/health");
    info!("   Readiness:     GET  http://{host}:{port}/ready");
    info!("=== End of Endpoint List ===");
}
