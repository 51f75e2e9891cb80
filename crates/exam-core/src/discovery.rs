//! Definition discovery and batch execution

use crate::cancel::CancellationToken;
use crate::config::RunConfig;
use crate::result::TestResult;
use crate::runner::run_single_test_with;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Find every definition file under `path`
///
/// A file is returned on its own when it carries the extension. A directory
/// is walked to any depth, following symlinks, with entries sorted by name.
/// Anything else yields nothing.
pub fn discover(path: &Path, extension: &str) -> Vec<PathBuf> {
    if path.is_file() {
        return if has_extension(path, extension) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };
    }
    if !path.is_dir() {
        debug!(path = %path.display(), "nothing to discover");
        return Vec::new();
    }

    let mut scripts = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                    scripts.push(entry.into_path());
                }
            }
            Err(e) => {
                if let Some(ancestor) = e.loop_ancestor() {
                    warn!(
                        ancestor = %ancestor.display(),
                        "skipping symlink loop"
                    );
                } else {
                    warn!(error = %e, "skipping unreadable entry");
                }
            }
        }
    }
    debug!(root = %path.display(), count = scripts.len(), "discovered definitions");
    scripts
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(extension))
}

/// Discover and run every definition under `path`, one result per file
pub fn run_tests(path: &Path, config: &RunConfig) -> Vec<TestResult> {
    run_tests_with(path, config, &CancellationToken::new(), |_| {})
}

/// Discover and run with cancellation and a per-result observer
///
/// The observer is called as each test completes, possibly from worker
/// threads and out of order. The returned list is in discovery order and
/// holds no entry for tests that were cancelled or never started.
pub fn run_tests_with<F>(
    path: &Path,
    config: &RunConfig,
    cancel: &CancellationToken,
    observer: F,
) -> Vec<TestResult>
where
    F: Fn(&TestResult) + Sync,
{
    let scripts = discover(path, &config.extension);
    run_scripts_with(&scripts, config, cancel, observer)
}

/// Run an already discovered list of definitions
pub fn run_scripts_with<F>(
    scripts: &[PathBuf],
    config: &RunConfig,
    cancel: &CancellationToken,
    observer: F,
) -> Vec<TestResult>
where
    F: Fn(&TestResult) + Sync,
{
    let run_one = |script: &PathBuf| {
        if cancel.is_cancelled() {
            return None;
        }
        let result = run_single_test_with(script, config, cancel)?;
        observer(&result);
        Some(result)
    };

    if config.runs_in_parallel() {
        debug!(count = scripts.len(), "running definitions in parallel");
        scripts.par_iter().filter_map(run_one).collect()
    } else {
        debug!(count = scripts.len(), "running definitions sequentially");
        scripts.iter().filter_map(run_one).collect()
    }
}
