//! Configuration loading and resolution
//!
//! Resolution order for the config file:
//! 1. Command-line argument (highest priority)
//! 2. `LSR_CONFIG` environment variable
//! 3. `~/.config/lsr/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable file never stops the service: a warning is logged
//! and compiled defaults are used. Secrets may additionally come from the
//! environment, which overrides TOML values.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LSR_CONFIG";

/// Environment variable overriding the refinement API key
pub const REFINER_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Environment variables overriding backup credentials
pub const BACKUP_USER_ENV_VAR: &str = "LSR_BACKUP_USERNAME";
pub const BACKUP_PASSWORD_ENV_VAR: &str = "LSR_BACKUP_PASSWORD";

/// Option list for one judgement category
///
/// The editable option is the single choice that unlocks rewritten text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet {
    pub label: String,
    pub options: Vec<String>,
    pub editable_option: String,
}

impl ChoiceSet {
    pub fn new(label: &str, options: &[&str], editable_option: &str) -> Self {
        Self {
            label: label.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            editable_option: editable_option.to_string(),
        }
    }

    /// True when `choice` is one of the configured options
    pub fn contains(&self, choice: &str) -> bool {
        self.options.iter().any(|o| o == choice)
    }

    /// True when `choice` unlocks rewritten-text fields
    pub fn is_editable(&self, choice: &str) -> bool {
        !choice.is_empty() && choice == self.editable_option
    }

    /// Check that the editable option is itself selectable
    pub fn validate(&self) -> Result<()> {
        if self.options.is_empty() {
            return Err(Error::Config(format!("'{}' has no options", self.label)));
        }
        if !self.contains(&self.editable_option) {
            return Err(Error::Config(format!(
                "'{}': editable option '{}' is not in {:?}",
                self.label, self.editable_option, self.options
            )));
        }
        Ok(())
    }
}

/// Choice sets for the three judgement categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceConfig {
    pub scenario: ChoiceSet,
    pub question1: ChoiceSet,
    pub question2: ChoiceSet,
}

impl Default for ChoiceConfig {
    fn default() -> Self {
        Self {
            scenario: ChoiceSet::new("Scenario", &["Conform", "Delete", "Modify"], "Modify"),
            question1: ChoiceSet::new(
                "Lab Safety Related Issues",
                &["Correct", "Delete", "Modify"],
                "Modify",
            ),
            question2: ChoiceSet::new(
                "Decisions and Consequences",
                &["Correct", "Delete", "Modify"],
                "Modify",
            ),
        }
    }
}

impl ChoiceConfig {
    pub fn validate(&self) -> Result<()> {
        self.scenario.validate()?;
        self.question1.validate()?;
        self.question2.validate()
    }
}

/// Text-refinement endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinerConfig {
    /// OpenAI-compatible API base, without the `/chat/completions` suffix
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-2024-11-20".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Remote backup (WebDAV PUT) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub base_url: String,
    pub namespace: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dav.jianguoyun.com/dav".to_string(),
            namespace: "LabSafety".to_string(),
            username: None,
            password: None,
            timeout_secs: 60,
        }
    }
}

impl BackupConfig {
    /// Both credentials present and non-blank
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.username, &self.password),
            (Some(u), Some(p)) if is_valid_secret(u) && is_valid_secret(p)
        )
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Folder under which `<name>/<name>_annotation.json` files live
    pub data_dir: PathBuf,
    pub scenario: ChoiceSet,
    pub question1: ChoiceSet,
    pub question2: ChoiceSet,
    pub refiner: RefinerConfig,
    pub backup: BackupConfig,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let choices = ChoiceConfig::default();
        Self {
            data_dir: PathBuf::from("data"),
            scenario: choices.scenario,
            question1: choices.question1,
            question2: choices.question2,
            refiner: RefinerConfig::default(),
            backup: BackupConfig::default(),
        }
    }
}

impl ReviewConfig {
    /// Parse TOML text; absent sections take compiled defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ReviewConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.choices().validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Choice sets injected into the review session
    pub fn choices(&self) -> ChoiceConfig {
        ChoiceConfig {
            scenario: self.scenario.clone(),
            question1: self.question1.clone(),
            question2: self.question2.clone(),
        }
    }

    /// Apply secret overrides from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = env_secret(REFINER_KEY_ENV_VAR) {
            self.refiner.api_key = Some(key);
        }
        if let Some(user) = env_secret(BACKUP_USER_ENV_VAR) {
            self.backup.username = Some(user);
        }
        if let Some(password) = env_secret(BACKUP_PASSWORD_ENV_VAR) {
            self.backup.password = Some(password);
        }
    }
}

/// Resolve which config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: user config directory
    let user_config = default_config_path()?;
    user_config.exists().then_some(user_config)
}

/// `~/.config/lsr/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lsr").join("config.toml"))
}

/// Load configuration with graceful fallback to compiled defaults
pub fn load_config(cli_arg: Option<&Path>) -> ReviewConfig {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) => match ReviewConfig::from_file(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using compiled defaults", e);
                ReviewConfig::default()
            }
        },
        None => {
            info!("No config file found; using compiled defaults");
            ReviewConfig::default()
        }
    };

    config.apply_env_overrides();
    config
}

/// Non-empty, non-whitespace secret
pub fn is_valid_secret(value: &str) -> bool {
    !value.trim().is_empty()
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_secret(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReviewConfig::default();
        config.choices().validate().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.scenario.editable_option, "Modify");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReviewConfig::from_toml_str(
            r#"
            data_dir = "/srv/review"

            [question2]
            label = "Decisions"
            options = ["Keep", "Drop", "Rewrite"]
            editable_option = "Rewrite"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/review"));
        assert_eq!(config.question2.editable_option, "Rewrite");
        assert_eq!(config.scenario, ChoiceConfig::default().scenario);
        assert_eq!(config.refiner.model, "gpt-4o-2024-11-20");
    }

    #[test]
    fn test_editable_option_must_be_listed() {
        let err = ReviewConfig::from_toml_str(
            r#"
            [scenario]
            label = "Scenario"
            options = ["Conform", "Delete"]
            editable_option = "Modify"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_is_editable_ignores_unset() {
        let set = ChoiceSet::new("S", &["A", "B"], "B");
        assert!(set.is_editable("B"));
        assert!(!set.is_editable("A"));
        assert!(!set.is_editable(""));
    }

    #[test]
    fn test_backup_credentials_require_both() {
        let mut backup = BackupConfig::default();
        assert!(!backup.has_credentials());
        backup.username = Some("reviewer".to_string());
        assert!(!backup.has_credentials());
        backup.password = Some("  ".to_string());
        assert!(!backup.has_credentials());
        backup.password = Some("secret".to_string());
        assert!(backup.has_credentials());
    }
}
