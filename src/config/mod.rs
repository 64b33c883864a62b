//! # Context Core Configuration
//!
//! Layered configuration: built-in defaults, then `context.toml`, then an
//! environment-specific `<env>.toml`, then `CONTEXT_*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use context_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let placement = manager.config().ordering.default_placement;
//! let pool_size = manager.config().database.max_connections;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::ordering::Placement;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/context.toml`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContextConfig {
    /// Database connection and pooling configuration
    pub database: DatabaseConfig,

    /// List ordering behaviour
    pub ordering: OrderingConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/contexts_development".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrderingConfig {
    /// Where contexts land when a create request names no placement
    pub default_placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; falls back to `RUST_LOG`, then the environment default
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl ContextConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database.url",
                "database configuration",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "must be at least 1",
            ));
        }

        if self.database.acquire_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.acquire_timeout_seconds",
                "0",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}
