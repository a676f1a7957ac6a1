//! # Structured Logging
//!
//! Environment-aware `tracing` setup for services embedding the pipeline.
//! Library code only emits events; installing a subscriber is left to the
//! host, which may call [`init_structured_logging`] once at startup.
//!
//! `RUST_LOG` overrides the per-environment level. Setting
//! `QUERYSET_LOG_FORMAT=json` switches console output to JSON lines.

use crate::config::detect_environment;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber; later calls are no-ops
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let layer = if json_output() {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter)
                .boxed()
        };

        // Hosts may already own the global subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(environment = %environment, "Structured logging initialized");
    });
}

fn json_output() -> bool {
    std::env::var("QUERYSET_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}

/// Log one pipeline stage transformation
pub fn log_stage_operation(stage: &str, schema: Option<&str>, status: &str, details: Option<&str>) {
    tracing::debug!(
        stage = %stage,
        schema = schema,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "STAGE_OPERATION"
    );
}

/// Log a request rejected before reaching the store
pub fn log_rejected_request(status_code: u16, location: &str, message: &str) {
    tracing::warn!(
        status_code = status_code,
        location = %location,
        message = %message,
        timestamp = %Utc::now().to_rfc3339(),
        "REJECTED_REQUEST"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "warn");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        assert!(LOGGER_INITIALIZED.get().is_some());
    }
}
