//! Global Configuration (~/.exam/config.toml)
//!
//! User-level settings that persist across suites: the interpreter to test
//! and the default script root.

use crate::{invalid, read_config_file, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.exam/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Interpreter executable used when no project sets one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<PathBuf>,

    /// Directory holding the test definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_root: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = read_config_file(path)?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration, creating the parent directory if needed
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(defaults) = &self.defaults {
            if defaults
                .interpreter
                .as_ref()
                .is_some_and(|p| p.as_os_str().is_empty())
            {
                return Err(invalid("defaults.interpreter", "path cannot be empty"));
            }
            if defaults
                .script_root
                .as_ref()
                .is_some_and(|p| p.as_os_str().is_empty())
            {
                return Err(invalid("defaults.script_root", "path cannot be empty"));
            }
        }
        Ok(())
    }

    /// Get the global config file path (~/.exam/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".exam").join("config.toml"))
    }

    pub fn interpreter(&self) -> Option<&Path> {
        self.defaults.as_ref().and_then(|d| d.interpreter.as_deref())
    }

    pub fn script_root(&self) -> Option<&Path> {
        self.defaults.as_ref().and_then(|d| d.script_root.as_deref())
    }

    pub fn set_interpreter(&mut self, path: impl Into<PathBuf>) {
        self.defaults.get_or_insert_with(Default::default).interpreter = Some(path.into());
    }

    pub fn set_script_root(&mut self, path: impl Into<PathBuf>) {
        self.defaults.get_or_insert_with(Default::default).script_root = Some(path.into());
    }
}
