//! Run command - execute a definition's sources without comparing

use crate::commands::{build_run_config, load_settings, RunOverrides};
use crate::config::Config as OutputConfig;
use anyhow::{bail, Context, Result};
use colored::*;
use exam_core::{run_script, CancellationToken, ProcessResult, RunConfig, TestDefinition};
use std::io::{self, Write};
use std::path::Path;

/// Run the sources of a definition and show what the interpreter printed
pub fn run(definition: &Path, overrides: &RunOverrides) -> Result<()> {
    OutputConfig::from_env().apply_color(false);
    let config = build_run_config(&load_settings()?, overrides)?;
    let result = execute(&load(definition)?, definition, &config)?;

    print!("{}", result.stdout);
    io::stdout().flush()?;
    eprint!("{}", result.stderr);
    eprintln!("{} {}", "Return code:".bold(), result.returncode);
    Ok(())
}

pub fn load(definition: &Path) -> Result<TestDefinition> {
    TestDefinition::load(definition)
        .with_context(|| format!("Failed to load definition: {}", definition.display()))
}

/// Run a definition's sources; execution failures become errors
pub fn execute(
    test: &TestDefinition,
    definition: &Path,
    config: &RunConfig,
) -> Result<ProcessResult> {
    if !test.has_entry(&config.entry_file) {
        eprintln!(
            "{} no source file named '{}' in {}",
            "warning:".yellow().bold(),
            config.entry_file,
            definition.display()
        );
    }

    let (ok, result) = run_script(&test.code, &test.stdin, config, &CancellationToken::new());
    if !ok {
        if result.exceptiondetail.is_empty() {
            bail!("{}", result.exception);
        }
        bail!("{}: {}", result.exception, result.exceptiondetail);
    }
    Ok(result)
}
