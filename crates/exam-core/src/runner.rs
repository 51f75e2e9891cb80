//! Single-test execution
//!
//! One definition goes through load, validate, materialize, execute and
//! compare. Every failure along the way is folded into an `Exception`
//! verdict so a batch never loses a result.

use crate::cancel::CancellationToken;
use crate::config::RunConfig;
use crate::definition::{Expected, SourceFile, TestDefinition};
use crate::error::{ExecError, ExecResult, LoadError};
use crate::executor::{execute, ExecRequest};
use crate::materialize::{Materialized, Workspace};
use crate::result::{Mismatch, OutputField, ProcessResult, TestResult};
use std::path::Path;
use tracing::debug;

/// Fields of `actual` that differ from `expected`, by exact string equality
pub fn compare(expected: &Expected, actual: &ProcessResult) -> Vec<Mismatch> {
    [
        (OutputField::Stdout, &expected.stdout, &actual.stdout),
        (OutputField::Stderr, &expected.stderr, &actual.stderr),
        (OutputField::Returncode, &expected.returncode, &actual.returncode),
    ]
    .into_iter()
    .filter(|(_, expected, actual)| expected != actual)
    .map(|(field, expected, actual)| Mismatch {
        field,
        expected: expected.clone(),
        actual: actual.clone(),
    })
    .collect()
}

/// Execute sources without comparing against anything
///
/// Returns `(ok, result)` where `ok` is true when the interpreter ran to
/// completion, whatever its exit code.
pub fn run_script(
    files: &[SourceFile],
    stdin: &str,
    config: &RunConfig,
    cancel: &CancellationToken,
) -> (bool, ProcessResult) {
    let result = match execute_sources(files, stdin, config, cancel) {
        Ok(result) => result,
        Err(e) => e.to_process_result(),
    };
    (result.is_ok(), result)
}

/// Run one definition file to a verdict
pub fn run_single_test(script: &Path, config: &RunConfig) -> TestResult {
    match run_single_test_with(script, config, &CancellationToken::new()) {
        Some(result) => result,
        // A fresh token is never cancelled
        None => TestResult::exception(script, ExecError::Cancelled.to_process_result()),
    }
}

/// Run one definition file; `None` when the run was cancelled before a
/// verdict was reached.
pub fn run_single_test_with(
    script: &Path,
    config: &RunConfig,
    cancel: &CancellationToken,
) -> Option<TestResult> {
    let definition = match TestDefinition::load(script) {
        Ok(definition) => definition,
        Err(e) => {
            debug!(script = %script.display(), error = %e, "definition rejected");
            return Some(TestResult::exception(script, load_failure(&e, script, config)));
        }
    };

    let actual = match execute_sources(&definition.code, &definition.stdin, config, cancel) {
        Ok(actual) => actual,
        Err(ExecError::Cancelled) => return None,
        Err(e) => return Some(TestResult::exception(script, e.to_process_result())),
    };

    let mismatches = compare(&definition.expected, &actual);
    let result = if mismatches.is_empty() {
        TestResult::pass(script, actual)
    } else {
        TestResult::fail(script, actual, mismatches)
    };
    debug!(script = %script.display(), status = %result.status, "test finished");
    Some(result)
}

fn load_failure(error: &LoadError, script: &Path, config: &RunConfig) -> ProcessResult {
    match error {
        LoadError::Schema(violation) => {
            ProcessResult::failure(format!("Schema {}", violation.kind))
                .with_detail(violation.to_string())
        }
        _ => ProcessResult::failure(format!(
            "{} while loading {}: {}",
            error.kind_name(),
            config.display_path(script).display(),
            error.cause()
        )),
    }
}

fn execute_sources(
    files: &[SourceFile],
    stdin: &str,
    config: &RunConfig,
    cancel: &CancellationToken,
) -> ExecResult<ProcessResult> {
    let workspace = Workspace::acquire(&config.isolation).map_err(ExecError::os)?;
    // Dropped before the workspace, so sources go before their directory
    let materialized = Materialized::write(workspace.path(), files).map_err(ExecError::os)?;

    let request = ExecRequest {
        interpreter: &config.interpreter,
        entry_file: &config.entry_file,
        stdin,
        timeout: config.timeout,
        cwd: materialized.dir(),
        max_capture_bytes: config.max_capture_bytes,
    };
    let captured = execute(&request, cancel)?;
    Ok(ProcessResult::captured(
        captured.stdout,
        captured.stderr,
        captured.code,
    ))
}
