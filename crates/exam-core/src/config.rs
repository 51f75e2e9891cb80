//! Run configuration passed explicitly into the engine

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the file the interpreter is started on
pub const DEFAULT_ENTRY_FILE: &str = "main.x";

/// Seconds before the interpreter is killed
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Mandatory extension of test definition files
pub const DEFAULT_EXTENSION: &str = ".json";

/// Per-stream capture limit for stdout and stderr
pub const DEFAULT_MAX_CAPTURE_BYTES: usize = 1024 * 1024;

/// Where source files are materialized for an execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Isolation {
    /// A fresh temporary directory per execution, removed afterwards
    #[default]
    Isolated,
    /// A fixed directory shared by all executions (sequential only)
    Shared(PathBuf),
}

/// Read-only settings for one run
///
/// Every engine entry point takes this by reference; nothing in the engine
/// reads process-wide state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Interpreter executable
    pub interpreter: PathBuf,
    /// File name the interpreter is invoked on
    pub entry_file: String,
    /// Wall-clock limit per execution
    pub timeout: Duration,
    /// Mandatory extension of definition files (including the dot)
    pub extension: String,
    /// Root of the definition tree, used to shorten paths in messages
    pub script_root: Option<PathBuf>,
    /// Working directory strategy
    pub isolation: Isolation,
    /// Whether independent tests may run concurrently
    pub parallel: bool,
    /// Capture limit per output stream
    pub max_capture_bytes: usize,
}

impl RunConfig {
    /// Create a configuration for the given interpreter with default settings
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            entry_file: DEFAULT_ENTRY_FILE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            extension: DEFAULT_EXTENSION.to_string(),
            script_root: None,
            isolation: Isolation::default(),
            parallel: true,
            max_capture_bytes: DEFAULT_MAX_CAPTURE_BYTES,
        }
    }

    pub fn with_entry_file(mut self, entry_file: impl Into<String>) -> Self {
        self.entry_file = entry_file.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_script_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.script_root = Some(root.into());
        self
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_capture_bytes(mut self, limit: usize) -> Self {
        self.max_capture_bytes = limit;
        self
    }

    /// Parallel execution needs a private directory per test, otherwise the
    /// shared entry file name collides.
    pub fn runs_in_parallel(&self) -> bool {
        self.parallel && self.isolation == Isolation::Isolated
    }

    /// Path of a definition as shown in messages: relative to the script
    /// root when one is configured.
    pub fn display_path(&self, script: &Path) -> PathBuf {
        self.script_root
            .as_deref()
            .and_then(|root| pathdiff::diff_paths(script, root))
            .unwrap_or_else(|| script.to_path_buf())
    }
}

/// Render a timeout bound in seconds, without a fraction when it is whole
pub fn format_seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{}", duration.as_secs_f64())
    }
}
