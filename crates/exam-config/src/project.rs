//! Project Configuration (exam.toml)
//!
//! Per-suite settings stored in `exam.toml`. Relative paths are interpreted
//! against the directory holding the file.

use crate::{invalid, read_config_file, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Project configuration from exam.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Interpreter invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<InterpreterConfig>,

    /// Test definition tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite: Option<SuiteConfig>,

    /// Execution settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerConfig>,
}

/// Interpreter invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Interpreter executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// File the interpreter is started on (default: "main.x")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_file: Option<String>,

    /// Seconds before a test is killed (default: 5)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Test definition tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SuiteConfig {
    /// Root directory of the definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Definition file extension (default: ".json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// Execution settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Run independent tests concurrently (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Capture limit per output stream in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_capture_bytes: Option<usize>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = read_config_file(path)?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(interpreter) = &self.interpreter {
            if interpreter
                .path
                .as_ref()
                .is_some_and(|p| p.as_os_str().is_empty())
            {
                return Err(invalid("interpreter.path", "path cannot be empty"));
            }
            if let Some(entry_file) = &interpreter.entry_file {
                validate_entry_file(entry_file)?;
            }
            if interpreter.timeout == Some(0) {
                return Err(invalid("interpreter.timeout", "timeout must be at least 1 second"));
            }
        }

        if let Some(extension) = self.suite.as_ref().and_then(|s| s.extension.as_deref()) {
            if !extension.starts_with('.') || extension.len() < 2 {
                return Err(invalid(
                    "suite.extension",
                    format!("extension must start with '.', got '{}'", extension),
                ));
            }
        }

        if self.runner.as_ref().and_then(|r| r.max_capture_bytes) == Some(0) {
            return Err(invalid("runner.max_capture_bytes", "limit must be positive"));
        }

        Ok(())
    }

    /// Make relative paths absolute against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(path) = self.interpreter.as_mut().and_then(|i| i.path.as_mut()) {
            // Bare command names are looked up on PATH instead
            if path.components().count() > 1 && path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(root) = self.suite.as_mut().and_then(|s| s.root.as_mut()) {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
    }

    pub fn interpreter_path(&self) -> Option<&Path> {
        self.interpreter.as_ref().and_then(|i| i.path.as_deref())
    }

    pub fn entry_file(&self) -> Option<&str> {
        self.interpreter
            .as_ref()
            .and_then(|i| i.entry_file.as_deref())
    }

    pub fn timeout(&self) -> Option<u64> {
        self.interpreter.as_ref().and_then(|i| i.timeout)
    }

    pub fn suite_root(&self) -> Option<&Path> {
        self.suite.as_ref().and_then(|s| s.root.as_deref())
    }

    pub fn extension(&self) -> Option<&str> {
        self.suite.as_ref().and_then(|s| s.extension.as_deref())
    }

    pub fn parallel(&self) -> Option<bool> {
        self.runner.as_ref().and_then(|r| r.parallel)
    }

    pub fn max_capture_bytes(&self) -> Option<usize> {
        self.runner.as_ref().and_then(|r| r.max_capture_bytes)
    }
}

/// Entry files are written into the working directory, so only a plain file
/// name is accepted.
pub fn validate_entry_file(entry_file: &str) -> ConfigResult<()> {
    let mut components = Path::new(entry_file).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid(
            "interpreter.entry_file",
            format!("'{}' is not a plain file name", entry_file),
        )),
    }
}
