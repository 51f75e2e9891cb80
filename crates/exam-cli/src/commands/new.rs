//! New command - create a skeleton definition

use crate::commands::load_settings;
use anyhow::{bail, Context, Result};
use colored::*;
use exam_core::config::{DEFAULT_ENTRY_FILE, DEFAULT_EXTENSION};
use exam_core::TestDefinition;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Create a definition with one empty entry file
pub fn run(path: &Path, entry_file: Option<&str>) -> Result<()> {
    let settings = load_settings()?;
    let extension = settings.extension().unwrap_or(DEFAULT_EXTENSION);
    let entry_file = entry_file
        .or(settings.entry_file())
        .unwrap_or(DEFAULT_ENTRY_FILE);
    exam_config::project::validate_entry_file(entry_file)?;

    create(path, entry_file, extension)?;
    println!("{} {}", "Created".green().bold(), path.display());
    Ok(())
}

/// Write the skeleton; never overwrites an existing file
pub fn create(path: &Path, entry_file: &str, extension: &str) -> Result<TestDefinition> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if !file_name_pattern(extension)?.is_match(name) {
        bail!(
            "Invalid definition name '{}': use letters, digits and '_' followed by '{}'",
            name,
            extension
        );
    }
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let test = TestDefinition::skeleton(entry_file);
    test.save(path)
        .with_context(|| format!("Failed to write definition: {}", path.display()))?;
    Ok(test)
}

fn file_name_pattern(extension: &str) -> Result<Regex> {
    let pattern = format!(r"^\w+{}$", regex::escape(extension));
    Regex::new(&pattern).context("Invalid definition extension")
}
