//! Configuration Loader
//!
//! Environment-aware configuration loading built on the `config` crate.
//! Sources are layered lowest to highest precedence:
//!
//! 1. [`ContextConfig::default`]
//! 2. `<config_dir>/context.toml`
//! 3. `<config_dir>/<environment>.toml`
//! 4. `CONTEXT_*` environment variables, `__` between nesting levels
//!    (e.g. `CONTEXT_DATABASE__URL`, `CONTEXT_ORDERING__DEFAULT_PLACEMENT=top`)

use super::error::ConfigResult;
use super::ContextConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Base file name inside the configuration directory
const BASE_CONFIG_FILE: &str = "context.toml";

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "CONTEXT";

pub struct ConfigManager {
    config: ContextConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::build(&config_directory, environment)?;
        config.validate()?;

        debug!(
            environment = %environment,
            database_url = %Self::redact_url(&config.database.url),
            max_connections = config.database.max_connections,
            default_placement = %config.ordering.default_placement,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    fn build(config_directory: &Path, environment: &str) -> ConfigResult<ContextConfig> {
        let config = Config::builder()
            .add_source(Config::try_from(&ContextConfig::default())?)
            .add_source(File::from(config_directory.join(BASE_CONFIG_FILE)).required(false))
            .add_source(
                File::from(config_directory.join(format!("{environment}.toml"))).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize::<ContextConfig>()?)
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect the runtime environment name
    pub fn detect_environment() -> String {
        env::var("CONTEXT_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// Mask the password portion of a connection URL for logging
    pub fn redact_url(url: &str) -> String {
        let Some(scheme_end) = url.find("://") else {
            return url.to_string();
        };
        let rest = &url[scheme_end + 3..];
        let Some(at) = rest.find('@') else {
            return url.to_string();
        };

        let credentials = &rest[..at];
        match credentials.find(':') {
            Some(colon) => format!(
                "{}{}:***{}",
                &url[..scheme_end + 3],
                &credentials[..colon],
                &rest[at..]
            ),
            None => url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::Placement;
    use std::fs;

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();

        assert_eq!(manager.config(), &ContextConfig::default());
        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config_directory(), dir.path());
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("context.toml"),
            r#"
            [database]
            url = "postgresql://app:secret@db/contexts"
            max_connections = 4

            [ordering]
            default_placement = "top"
            "#,
        )
        .unwrap();
        fs::write(
            dir.path().join("production.toml"),
            r#"
            [database]
            max_connections = 32

            [logging]
            json = true
            "#,
        )
        .unwrap();

        let manager = ConfigManager::load_from_directory_with_env(
            Some(dir.path().to_path_buf()),
            "production",
        )
        .unwrap();
        let config = manager.config();

        assert_eq!(config.database.url, "postgresql://app:secret@db/contexts");
        assert_eq!(config.database.max_connections, 32);
        assert_eq!(config.ordering.default_placement, Placement::Top);
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("context.toml"),
            "[database]\nmax_connections = 0\n",
        )
        .unwrap();

        assert!(ConfigManager::load_from_directory_with_env(
            Some(dir.path().to_path_buf()),
            "test"
        )
        .is_err());
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            ConfigManager::redact_url("postgresql://app:secret@db:5432/contexts"),
            "postgresql://app:***@db:5432/contexts"
        );
        assert_eq!(
            ConfigManager::redact_url("postgresql://localhost/contexts"),
            "postgresql://localhost/contexts"
        );
        assert_eq!(
            ConfigManager::redact_url("postgresql://app@db/contexts"),
            "postgresql://app@db/contexts"
        );
    }
}
