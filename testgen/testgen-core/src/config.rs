//! Configuration for testgen.
//!
//! Configuration is read from a TOML file and can be overridden through
//! environment variables. Lookup order for the file:
//!
//! 1. an explicit path (the CLI `--config` flag),
//! 2. the `TESTGEN_CONFIG_PATH` environment variable,
//! 3. `testgen.toml` in the current directory,
//! 4. built-in defaults.
//!
//! # Example
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [imports]
//! local_prefix = "example.com/myorg"
//! ```

use crate::error::{Result, TestgenError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "testgen.toml";

// Environment variable names
pub const ENV_CONFIG_PATH: &str = "TESTGEN_CONFIG_PATH";
pub const ENV_LOG_LEVEL: &str = "TESTGEN_LOG_LEVEL";
pub const ENV_LOCAL_PREFIX: &str = "TESTGEN_LOCAL_PREFIX";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestgenConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub imports: ImportsConfig,
}

/// General configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Import formatting settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportsConfig {
    /// Import path prefix that is grouped after third-party imports,
    /// like `goimports -local`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_prefix: Option<String>,
}

impl TestgenConfig {
    /// Resolve the configuration file location, if any exists.
    pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        local.exists().then_some(local)
    }

    /// Load configuration from the discovered location, falling back to
    /// defaults, then apply environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::discover(explicit) {
            Some(path) => Self::read_file(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.merge_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.merge_env_vars();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| TestgenError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TestgenError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TestgenError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TestgenError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }
        std::fs::write(path, self.to_toml()?)
            .map_err(|e| TestgenError::Config(format!("Failed to write config file: {}", e)))?;
        debug!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn merge_env_vars(&mut self) {
        self.merge_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn merge_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            debug!("Overriding log_level from environment: {}", log_level);
            self.general.log_level = log_level;
        }

        if let Some(prefix) = lookup(ENV_LOCAL_PREFIX) {
            debug!("Overriding local import prefix from environment: {}", prefix);
            self.imports.local_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(TestgenError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if let Some(prefix) = &self.imports.local_prefix {
            if prefix.contains(char::is_whitespace) || prefix.contains('"') {
                return Err(TestgenError::Config(format!(
                    "Invalid local import prefix '{}'",
                    prefix
                )));
            }
        }

        Ok(())
    }

    /// The configured local import prefix, if any.
    pub fn local_prefix(&self) -> Option<&str> {
        self.imports.local_prefix.as_deref()
    }
}
