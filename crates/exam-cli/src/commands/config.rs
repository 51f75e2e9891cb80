//! Config command - inspect and persist settings

use crate::commands::load_settings;
use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use exam_config::{ConfigLoader, GlobalConfig};
use exam_core::config::{
    format_seconds, DEFAULT_ENTRY_FILE, DEFAULT_EXTENSION, DEFAULT_MAX_CAPTURE_BYTES,
    DEFAULT_TIMEOUT_SECS,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings that can be persisted globally
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    /// Interpreter executable
    Interpreter,
    /// Root directory of the definitions
    ScriptRoot,
}

/// Print the effective settings
pub fn show() -> Result<()> {
    let settings = load_settings()?;
    let global_path = ConfigLoader::new().global_config_path()?;

    println!("{} {}", "Global config:".bold(), global_path.display());
    match settings.project_root() {
        Some(root) => println!(
            "{} {}",
            "Project config:".bold(),
            root.join(exam_config::PROJECT_CONFIG_FILE).display()
        ),
        None => println!("{} {}", "Project config:".bold(), "(none)".dimmed()),
    }
    println!();

    print_value("interpreter", settings.interpreter().map(display_path));
    print_value("script root", settings.script_root().map(display_path));
    print_value(
        "entry file",
        Some(settings.entry_file().unwrap_or(DEFAULT_ENTRY_FILE).to_string()),
    );
    let timeout = settings
        .timeout()
        .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    print_value("timeout", Some(format!("{}s", format_seconds(timeout))));
    print_value(
        "extension",
        Some(settings.extension().unwrap_or(DEFAULT_EXTENSION).to_string()),
    );
    print_value(
        "parallel",
        Some(settings.parallel().unwrap_or(true).to_string()),
    );
    print_value(
        "capture limit",
        Some(format!(
            "{} bytes",
            settings
                .max_capture_bytes()
                .unwrap_or(DEFAULT_MAX_CAPTURE_BYTES)
        )),
    );
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn print_value(name: &str, value: Option<String>) {
    match value {
        Some(value) => println!("  {:<14} {}", name, value),
        None => println!("  {:<14} {}", name, "(not set)".dimmed()),
    }
}

/// Persist one setting in the global configuration file
pub fn set(key: SettingKey, value: &str) -> Result<()> {
    let path = ConfigLoader::new().global_config_path()?;
    let config = set_in_file(&path, key, value)?;
    println!(
        "{} {} = {} in {}",
        "Set".green().bold(),
        key_name(key),
        value,
        path.display()
    );
    tracing::debug!(?config, "saved global config");
    Ok(())
}

fn set_in_file(path: &Path, key: SettingKey, value: &str) -> Result<GlobalConfig> {
    let mut config = if path.exists() {
        GlobalConfig::load_from_file(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        GlobalConfig::default()
    };

    let value = PathBuf::from(value);
    match key {
        SettingKey::Interpreter => config.set_interpreter(value),
        SettingKey::ScriptRoot => config.set_script_root(value),
    }

    config
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(config)
}

fn key_name(key: SettingKey) -> &'static str {
    match key {
        SettingKey::Interpreter => "interpreter",
        SettingKey::ScriptRoot => "script-root",
    }
}

/// Print the global configuration file path
pub fn path() -> Result<()> {
    println!("{}", ConfigLoader::new().global_config_path()?.display());
    Ok(())
}
