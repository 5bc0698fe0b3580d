//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests the implementation of:
//! - Priority order: CLI argument → LSR_CONFIG → user config dir → defaults
//! - Missing or broken config files fall back to compiled defaults
//! - Secret overrides from the environment
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate LSR_CONFIG or secret variables are marked #[serial].

use lsr_common::config::{
    load_config, resolve_config_path, ReviewConfig, BACKUP_PASSWORD_ENV_VAR,
    BACKUP_USER_ENV_VAR, CONFIG_ENV_VAR, REFINER_KEY_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(REFINER_KEY_ENV_VAR);
    env::remove_var(BACKUP_USER_ENV_VAR);
    env::remove_var(BACKUP_PASSWORD_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_argument_wins_over_env() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/lsr-from-env.toml");

    let cli = PathBuf::from("/tmp/lsr-from-cli.toml");
    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/lsr-from-env.toml"))
    );

    clear_env();
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = load_config(Some(&missing));
    assert_eq!(config, ReviewConfig::default());
}

#[test]
#[serial]
fn test_broken_file_falls_back_to_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "data_dir = [not toml").unwrap();

    let config = load_config(Some(&path));
    assert_eq!(config.data_dir, ReviewConfig::default().data_dir);
}

#[test]
#[serial]
fn test_file_values_and_env_secrets() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        data_dir = "/srv/annotations"

        [backup]
        namespace = "Review"
        username = "toml-user"
        password = "toml-pass"

        [refiner]
        model = "gpt-4o-mini"
        "#,
    )
    .unwrap();

    env::set_var(REFINER_KEY_ENV_VAR, "sk-test");
    env::set_var(BACKUP_PASSWORD_ENV_VAR, "env-pass");
    env::set_var(BACKUP_USER_ENV_VAR, "   ");

    let config = load_config(Some(&path));
    assert_eq!(config.data_dir, PathBuf::from("/srv/annotations"));
    assert_eq!(config.refiner.model, "gpt-4o-mini");
    assert_eq!(config.refiner.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.backup.namespace, "Review");
    assert_eq!(config.backup.username.as_deref(), Some("toml-user"));
    assert_eq!(config.backup.password.as_deref(), Some("env-pass"));

    clear_env();
}
