//! Exam Core - conformance test execution engine
//!
//! This library runs test definitions against an external interpreter:
//! - Schema validation of persisted test definitions
//! - Materialization of source files into a working directory
//! - Process execution under a hard timeout with output capture
//! - Single-test verdicts (pass, fail, exception)
//! - Recursive discovery and batch execution of definition trees
//!
//! # Example
//!
//! ```no_run
//! use exam_core::{run_tests, RunConfig};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let config = RunConfig::new("/usr/local/bin/exin").with_timeout(Duration::from_secs(5));
//! for result in run_tests(Path::new("tests"), &config) {
//!     println!("{} {}", result.status, result.script.display());
//! }
//! ```

/// Exam core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cancel;
pub mod config;
pub mod definition;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod materialize;
pub mod result;
pub mod runner;
pub mod schema;

pub use cancel::CancellationToken;
pub use config::{Isolation, RunConfig};
pub use definition::{Expected, SourceFile, TestDefinition};
pub use discovery::{discover, run_scripts_with, run_tests, run_tests_with};
pub use error::{ExecError, ExecResult, LoadError};
pub use executor::{execute, Captured, ExecRequest};
pub use materialize::{Materialized, Workspace};
pub use result::{Mismatch, OutputField, ProcessResult, Summary, TestResult, TestStatus};
pub use runner::{compare, run_script, run_single_test, run_single_test_with};
pub use schema::{validate, SchemaViolation, ViolationKind};
