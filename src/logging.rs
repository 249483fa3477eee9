// ABOUTME: Logging configuration and structured logging setup for observability and debugging
// ABOUTME: Builds the tracing subscriber from the environment and emits auth/security events
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Structured logging
//!
//! One subscriber per process, configured from `RUST_LOG`, `LOG_FORMAT` and the
//! `LOG_INCLUDE_*` switches. Credentials never reach the log: callers pass a
//! [`fingerprint`](crate::revocation::fingerprint) instead.

use std::env;
use std::fmt;
use std::io;
use std::str::FromStr;

use anyhow::{bail, Result};
use tokenward_core::constants::service_names;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self as tracing_fmt, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::environment::Environment;

const DEFAULT_DIRECTIVE: &str = "info";

/// Targets that are chatty at `info` and below
const QUIET_TARGETS: &[&str] = &[
    "hyper=warn",
    "hyper_util=warn",
    "h2=warn",
    "tower_http=info",
    "redis=warn",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line, for log shippers
    Json,
    /// Multi-line human output
    #[default]
    Pretty,
    /// Single-line human output
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => bail!("Unknown LOG_FORMAT '{other}' (expected json, pretty or compact)"),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Pretty => f.write_str("pretty"),
            Self::Compact => f.write_str("compact"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `tokenward=debug,tower_http=info`
    pub directive: String,
    /// Output format
    pub format: LogFormat,
    /// Source file and line on every event
    pub with_location: bool,
    /// Thread id and name on every event
    pub with_thread: bool,
    /// Span open/close events
    pub with_span_events: bool,
    /// `service.name` field in the startup record
    pub service_name: String,
    /// Deployment environment
    pub environment: Environment,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directive: DEFAULT_DIRECTIVE.to_owned(),
            format: LogFormat::default(),
            with_location: false,
            with_thread: false,
            with_span_events: false,
            service_name: service_names::TOKENWARD_SERVER.to_owned(),
            environment: Environment::default(),
        }
    }
}

impl LoggingConfig {
    /// Read logging settings from environment variables
    ///
    /// Production defaults to JSON with locations, threads and span events.
    #[must_use]
    pub fn from_env() -> Self {
        let environment =
            Environment::from_str_or_default(&env::var("ENVIRONMENT").unwrap_or_default());
        let production = environment.is_production();

        let format = match env::var("LOG_FORMAT") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                eprintln!("{e}; falling back to pretty logs");
                LogFormat::Pretty
            }),
            Err(_) if production => LogFormat::Json,
            Err(_) => LogFormat::Pretty,
        };
        let switch = |name: &str| production || env::var(name).is_ok();

        Self {
            directive: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_DIRECTIVE.to_owned()),
            format,
            with_location: switch("LOG_INCLUDE_LOCATION"),
            with_thread: switch("LOG_INCLUDE_THREAD"),
            with_span_events: switch("LOG_INCLUDE_SPANS"),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::TOKENWARD_SERVER.to_owned()),
            environment,
        }
    }

    /// Configured directive with the quiet targets appended
    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_new(&self.directive).unwrap_or_else(|e| {
            eprintln!("Invalid log directive '{}': {e}; using info", self.directive);
            EnvFilter::new(DEFAULT_DIRECTIVE)
        });

        for target in QUIET_TARGETS {
            if let Ok(directive) = target.parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.with_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = tracing_fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.with_location)
            .with_line_number(self.with_location)
            .with_thread_ids(self.with_thread)
            .with_thread_names(self.with_thread)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Json => base.json().with_current_span(true).boxed(),
            LogFormat::Pretty => base.boxed(),
            LogFormat::Compact => base.compact().with_target(false).boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(self.env_filter())
            .try_init()?;

        info!(
            service.name = %self.service_name,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.directive = %self.directive,
            log.format = %self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// How loudly a security event should be treated downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected in normal operation, worth counting
    Low,
    /// A client did something it should not
    Medium,
    /// Possible credential theft or a degraded security posture
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Structured auth and security events
pub struct AppLogger;

impl AppLogger {
    /// Session lifecycle event: login, refresh or logout
    pub fn log_auth_event(subject: &str, event: &str, success: bool, details: Option<&str>) {
        info!(
            auth.subject = %subject,
            auth.event = %event,
            auth.success = success,
            auth.details = details.unwrap_or_default(),
            "Auth event"
        );
    }

    /// Security-relevant event such as revoked credential reuse or a store outage
    pub fn log_security_event(
        event_type: &str,
        severity: Severity,
        details: &str,
        subject: Option<&str>,
    ) {
        warn!(
            security.event = %event_type,
            security.severity = %severity,
            security.details = %details,
            auth.subject = subject.unwrap_or("unknown"),
            "Security event"
        );
    }
}
