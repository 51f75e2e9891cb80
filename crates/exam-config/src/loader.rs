//! Configuration Loader
//!
//! Loads configuration from multiple sources and merges them with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{validate_entry_file, ProjectConfig};
use crate::{invalid, ConfigError, ConfigResult, PROJECT_CONFIG_FILE};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loader
///
/// Sources, lowest priority first:
/// 1. Global config (~/.exam/config.toml)
/// 2. Project config (exam.toml)
/// 3. Environment variables (EXAM_*)
/// 4. CLI flags (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration, paths already absolute, env overrides applied
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Directory where exam.toml was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.exam/config.toml
    pub fn with_global_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find exam.toml, then loads the global
    /// config if it exists and applies environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.finish(project_root, project_config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let mut project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        if let Some(root) = &project_root {
            project_config.resolve_paths(root);
        }
        self.finish(project_root, project_config)
    }

    fn finish(
        &mut self,
        project_root: Option<PathBuf>,
        project_config: ProjectConfig,
    ) -> ConfigResult<Config> {
        let global_config = self.load_global_config()?;
        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.is_file() {
                let mut project_config = ProjectConfig::load_from_file(&config_path)?;
                project_config.resolve_paths(&current);
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Path of the global config file, resolved once
    pub fn global_config_path(&mut self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.global_config_path {
            return Ok(path.clone());
        }
        let path = GlobalConfig::global_config_path()?;
        self.global_config_path = Some(path.clone());
        Ok(path)
    }

    /// Load global configuration; a missing file (or home) is not an error
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match self.global_config_path() {
            Ok(path) => path,
            Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
            Err(e) => return Err(e),
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply EXAM_* environment variables to the project config
    ///
    /// Paths from the environment are taken as given, relative to the
    /// current directory.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Some(interpreter) = env_value("EXAM_INTERPRETER") {
            config.interpreter.get_or_insert_with(Default::default).path =
                Some(PathBuf::from(interpreter));
        }

        if let Some(entry_file) = env_value("EXAM_ENTRY_FILE") {
            validate_entry_file(&entry_file)?;
            config.interpreter.get_or_insert_with(Default::default).entry_file = Some(entry_file);
        }

        if let Some(timeout) = env_value("EXAM_TIMEOUT") {
            let seconds = parse_timeout(&timeout).ok_or_else(|| {
                invalid(
                    "EXAM_TIMEOUT",
                    format!("'{}' is not a positive number of seconds", timeout),
                )
            })?;
            config.interpreter.get_or_insert_with(Default::default).timeout = Some(seconds);
        }

        if let Some(root) = env_value("EXAM_SCRIPT_ROOT") {
            config.suite.get_or_insert_with(Default::default).root = Some(PathBuf::from(root));
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parse_timeout(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|seconds| *seconds > 0)
}

impl Config {
    /// Interpreter executable (project > global)
    pub fn interpreter(&self) -> Option<&Path> {
        self.project
            .interpreter_path()
            .or_else(|| self.global.interpreter())
    }

    /// Definition root (project > global)
    pub fn script_root(&self) -> Option<&Path> {
        self.project
            .suite_root()
            .or_else(|| self.global.script_root())
    }

    pub fn entry_file(&self) -> Option<&str> {
        self.project.entry_file()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.project.timeout().map(Duration::from_secs)
    }

    pub fn extension(&self) -> Option<&str> {
        self.project.extension()
    }

    pub fn parallel(&self) -> Option<bool> {
        self.project.parallel()
    }

    pub fn max_capture_bytes(&self) -> Option<usize> {
        self.project.max_capture_bytes()
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if an exam.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}
