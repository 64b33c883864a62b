//! Environment variable overrides. Kept in its own test binary because it
//! mutates process environment.

use context_core::config::ConfigManager;
use context_core::ordering::Placement;
use std::env;
use std::fs;

#[test]
fn test_environment_variables_override_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("context.toml"),
        r#"
        [database]
        max_connections = 4

        [ordering]
        default_placement = "bottom"
        "#,
    )
    .unwrap();

    env::set_var("CONTEXT_DATABASE__MAX_CONNECTIONS", "7");
    env::set_var("CONTEXT_ORDERING__DEFAULT_PLACEMENT", "top");

    let result =
        ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");

    env::remove_var("CONTEXT_DATABASE__MAX_CONNECTIONS");
    env::remove_var("CONTEXT_ORDERING__DEFAULT_PLACEMENT");

    let manager = result.unwrap();
    assert_eq!(manager.config().database.max_connections, 7);
    assert_eq!(manager.config().ordering.default_placement, Placement::Top);
}
