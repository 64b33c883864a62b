//! # Structured Logging Module
//!
//! Environment-aware console logging using the tracing ecosystem, plus
//! helpers that emit one structured event per context operation.

use crate::config::{ConfigManager, LoggingConfig};
use crate::models::core::context::{ContextId, UserId};
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific defaults
pub fn init_structured_logging() {
    init_structured_logging_with(&LoggingConfig::default());
}

/// Initialize structured logging from explicit settings.
///
/// Only the first call installs a subscriber. If another global subscriber
/// is already set (a host application, a test harness) it is left in place.
pub fn init_structured_logging_with(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let directive = resolve_log_directive(config, &environment);

        let fmt_layer = if config.json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stdout()))
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        };

        if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            filter = %directive,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// Pick the filter directive: explicit config, then `RUST_LOG`, then the environment default
fn resolve_log_directive(config: &LoggingConfig, environment: &str) -> String {
    config
        .level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| get_log_level(environment).to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}

/// Log structured data for context operations
pub fn log_context_operation(
    operation: &str,
    context_id: Option<ContextId>,
    user_id: Option<UserId>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        context_id = context_id,
        user_id = user_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "CONTEXT_OPERATION"
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
        assert_eq!(get_log_level("staging"), "debug");
    }

    #[test]
    fn test_explicit_level_wins() {
        let config = LoggingConfig {
            level: Some("context_core=trace".to_string()),
            json: false,
        };
        assert_eq!(
            resolve_log_directive(&config, "production"),
            "context_core=trace"
        );
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging_with(&LoggingConfig {
            level: Some("info".to_string()),
            json: true,
        });
        log_context_operation("context.test", Some(1), Some(1), "ok", None);
    }
}
