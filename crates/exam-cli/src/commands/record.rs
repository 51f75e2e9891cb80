//! Record command - store the current output as the expected result

use crate::commands::run::{execute, load};
use crate::commands::{build_run_config, load_settings, RunOverrides};
use crate::config::Config as OutputConfig;
use anyhow::{bail, Context, Result};
use colored::*;
use exam_core::{ProcessResult, RunConfig, TestDefinition};
use std::path::Path;

/// Run a definition and write its captured output into `expected`
pub fn run(definition: &Path, overrides: &RunOverrides) -> Result<()> {
    OutputConfig::from_env().apply_color(false);
    let config = build_run_config(&load_settings()?, overrides)?;
    let test = record(definition, &config)?;

    println!(
        "{} {} (return code {})",
        "Recorded".green().bold(),
        definition.display(),
        test.expected.returncode
    );
    Ok(())
}

/// Execute and save; the definition is left untouched when execution fails
pub fn record(definition: &Path, config: &RunConfig) -> Result<TestDefinition> {
    let mut test = load(definition)?;
    let result = execute(&test, definition, config)
        .with_context(|| format!("Nothing recorded for {}", definition.display()))?;

    store(&mut test, &result, definition)?;
    test.save(definition)
        .with_context(|| format!("Failed to write definition: {}", definition.display()))?;
    Ok(test)
}

/// Copy a captured result into `expected`; a failure result is refused
fn store(test: &mut TestDefinition, result: &ProcessResult, definition: &Path) -> Result<()> {
    if !test.record(result) {
        bail!(
            "Nothing recorded for {}: {}",
            definition.display(),
            result.exception
        );
    }
    Ok(())
}
