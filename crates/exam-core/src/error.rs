/// Engine error types
use crate::result::ProcessResult;
use crate::schema::SchemaViolation;
use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;
use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

/// Why an execution did not produce captured output
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command timed out after {seconds} seconds")]
    Timeout { seconds: String },

    #[error("interpreter {} not found", path.display())]
    InterpreterNotFound { path: PathBuf },

    #[error("{}", format_os(message, *code))]
    Os { message: String, code: Option<i32> },

    #[error("unexpected exception {0}")]
    Internal(String),

    #[error("execution cancelled")]
    Cancelled,
}

impl ExecError {
    /// Classify an OS error, keeping its errno when there is one
    pub fn os(error: io::Error) -> Self {
        let code = error.raw_os_error();
        let mut message = error.to_string();
        if let Some(code) = code {
            let suffix = format!(" (os error {})", code);
            if let Some(stripped) = message.strip_suffix(&suffix) {
                message = stripped.to_string();
            }
        }
        Self::Os { message, code }
    }

    /// Classify a failure to start the interpreter
    pub fn spawn(error: io::Error, interpreter: &Path) -> Self {
        if error.kind() == io::ErrorKind::NotFound {
            Self::InterpreterNotFound {
                path: interpreter.to_path_buf(),
            }
        } else {
            Self::os(error)
        }
    }

    pub fn internal(detail: impl ToString) -> Self {
        Self::Internal(detail.to_string())
    }

    /// Failure form of a process result: the message in `exception`,
    /// everything else empty.
    pub fn to_process_result(&self) -> ProcessResult {
        ProcessResult::failure(self.to_string())
    }
}

fn format_os(message: &str, code: Option<i32>) -> String {
    match code {
        Some(code) => format!("{} ({})", message, code),
        None => message.to_string(),
    }
}

/// Why a definition could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),
}

impl LoadError {
    /// Short failure class used in exception messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            LoadError::Io { .. } => "OSError",
            LoadError::Decode { .. } | LoadError::Parse { .. } => "ValueError",
            LoadError::Schema(_) => "SchemaViolation",
        }
    }

    /// Underlying cause without the path
    pub fn cause(&self) -> String {
        match self {
            LoadError::Io { source, .. } => source.to_string(),
            LoadError::Decode { source, .. } => source.to_string(),
            LoadError::Parse { source, .. } => source.to_string(),
            LoadError::Schema(violation) => violation.to_string(),
        }
    }
}
