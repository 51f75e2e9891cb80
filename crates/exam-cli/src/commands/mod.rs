pub mod config;
pub mod new;
pub mod record;
pub mod run;

use anyhow::{bail, Context, Result};
use exam_config::{Config, ConfigLoader};
use exam_core::RunConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Interpreter settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub interpreter: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub entry_file: Option<String>,
}

/// Load layered configuration starting from the current directory
pub fn load_settings() -> Result<Config> {
    let cwd = env::current_dir().context("Failed to determine current directory")?;
    ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("Failed to load configuration")
}

/// Build the engine configuration: settings first, command-line flags last
pub fn build_run_config(settings: &Config, overrides: &RunOverrides) -> Result<RunConfig> {
    let interpreter = match overrides
        .interpreter
        .as_deref()
        .or_else(|| settings.interpreter())
    {
        Some(interpreter) => interpreter.to_path_buf(),
        None => bail!(
            "No interpreter configured. Pass --interpreter, set EXAM_INTERPRETER, \
             or run 'exam config set interpreter <PATH>'"
        ),
    };

    let mut config = RunConfig::new(interpreter);
    if let Some(entry_file) = overrides.entry_file.as_deref().or(settings.entry_file()) {
        exam_config::project::validate_entry_file(entry_file)?;
        config = config.with_entry_file(entry_file);
    }
    if let Some(seconds) = overrides.timeout {
        config = config.with_timeout(Duration::from_secs(seconds));
    } else if let Some(timeout) = settings.timeout() {
        config = config.with_timeout(timeout);
    }
    if let Some(extension) = settings.extension() {
        config = config.with_extension(extension);
    }
    if let Some(root) = settings.script_root() {
        config = config.with_script_root(root);
    }
    if let Some(parallel) = settings.parallel() {
        config = config.with_parallel(parallel);
    }
    if let Some(limit) = settings.max_capture_bytes() {
        config = config.with_max_capture_bytes(limit);
    }
    Ok(config)
}
