//! Execution and verdict types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Output of one execution attempt
///
/// Either the captured fields are set and `exception` is empty, or
/// `exception` (and possibly `exceptiondetail`) is set and the rest is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub returncode: String,
    pub exception: String,
    pub exceptiondetail: String,
}

impl ProcessResult {
    /// A normal capture; the exit code is serialized as its decimal form
    pub fn captured(stdout: impl Into<String>, stderr: impl Into<String>, returncode: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            returncode: returncode.to_string(),
            ..Default::default()
        }
    }

    /// A failure carrying only a message
    pub fn failure(exception: impl Into<String>) -> Self {
        Self {
            exception: exception.into(),
            ..Default::default()
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.exceptiondetail = detail.into();
        self
    }

    /// True when the execution produced output rather than a failure
    pub fn is_ok(&self) -> bool {
        self.exception.is_empty()
    }
}

/// Verdict for one definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Exception,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Exception => "exception",
        };
        f.write_str(name)
    }
}

/// One of the compared output fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputField {
    Stdout,
    Stderr,
    Returncode,
}

impl fmt::Display for OutputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputField::Stdout => "stdout",
            OutputField::Stderr => "stderr",
            OutputField::Returncode => "returncode",
        };
        f.write_str(name)
    }
}

/// A field whose captured value differs from the expected one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub field: OutputField,
    pub expected: String,
    pub actual: String,
}

/// Final verdict for one definition file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub script: PathBuf,
    pub status: TestStatus,
    pub processresult: ProcessResult,
    /// Fields that differed; only set for `Fail`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<Mismatch>,
}

impl TestResult {
    pub fn pass(script: impl Into<PathBuf>, processresult: ProcessResult) -> Self {
        Self {
            script: script.into(),
            status: TestStatus::Pass,
            processresult,
            mismatches: Vec::new(),
        }
    }

    pub fn fail(
        script: impl Into<PathBuf>,
        processresult: ProcessResult,
        mismatches: Vec<Mismatch>,
    ) -> Self {
        Self {
            script: script.into(),
            status: TestStatus::Fail,
            processresult,
            mismatches,
        }
    }

    pub fn exception(script: impl Into<PathBuf>, processresult: ProcessResult) -> Self {
        Self {
            script: script.into(),
            status: TestStatus::Exception,
            processresult,
            mismatches: Vec::new(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == TestStatus::Pass
    }

    pub fn is_fail(&self) -> bool {
        self.status == TestStatus::Fail
    }

    pub fn is_exception(&self) -> bool {
        self.status == TestStatus::Exception
    }

    /// Script path relative to `root`, or unchanged when that is not possible
    pub fn relative_script(&self, root: Option<&Path>) -> PathBuf {
        root.and_then(|root| pathdiff::diff_paths(&self.script, root))
            .unwrap_or_else(|| self.script.clone())
    }
}

/// Counts over a result list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub executed: usize,
    pub passed: usize,
    pub failed: usize,
    pub exceptions: usize,
}

impl Summary {
    pub fn of(results: &[TestResult]) -> Self {
        let mut summary = Summary {
            executed: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.status {
                TestStatus::Pass => summary.passed += 1,
                TestStatus::Fail => summary.failed += 1,
                TestStatus::Exception => summary.exceptions += 1,
            }
        }
        summary
    }

    /// True when every result passed
    pub fn all_passed(&self) -> bool {
        self.passed == self.executed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tests executed, {} failed", self.executed, self.failed)
    }
}
