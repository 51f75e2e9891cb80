//! Test definition documents
//!
//! A definition is a JSON file holding the source files to run, the text fed
//! to the interpreter's stdin and the expected output. Loading always goes
//! through [`crate::schema::validate`] before any field is read.

use crate::error::LoadError;
use crate::result::ProcessResult;
use crate::schema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// One file to materialize; an empty name means "do not write"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub code: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Expected interpreter output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expected {
    pub stdout: String,
    pub stderr: String,
    pub returncode: String,
}

/// A complete test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub description: String,
    pub code: Vec<SourceFile>,
    pub stdin: String,
    pub expected: Expected,
}

impl TestDefinition {
    /// New definition with a single empty entry file, expecting a clean exit
    pub fn skeleton(entry_file: &str) -> Self {
        Self {
            description: String::new(),
            code: vec![SourceFile::new(entry_file, "")],
            stdin: String::new(),
            expected: Expected {
                returncode: "0".to_string(),
                ..Default::default()
            },
        }
    }

    /// Read, parse and validate a definition file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse and validate definition text; `origin` is only used in errors
    pub fn parse(text: &str, origin: &Path) -> Result<Self, LoadError> {
        let parse_error = |source| LoadError::Parse {
            path: origin.to_path_buf(),
            source,
        };
        let document: serde_json::Value = serde_json::from_str(text).map_err(parse_error)?;
        schema::validate(&document)?;
        serde_json::from_value(document).map_err(parse_error)
    }

    /// Write the definition as JSON indented by four spaces
    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_json()?)
    }

    pub fn to_json(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Whether one of the source files is the interpreter's entry point
    pub fn has_entry(&self, entry_file: &str) -> bool {
        self.find_source(entry_file).is_some()
    }

    pub fn find_source(&self, name: &str) -> Option<&SourceFile> {
        self.code.iter().find(|file| file.name == name)
    }

    /// Replace the expected block with captured output
    ///
    /// Returns false, leaving the definition unchanged, when the result is a
    /// failure rather than a capture.
    pub fn record(&mut self, result: &ProcessResult) -> bool {
        if !result.is_ok() {
            return false;
        }
        self.expected = Expected {
            stdout: result.stdout.clone(),
            stderr: result.stderr.clone(),
            returncode: result.returncode.clone(),
        };
        true
    }
}
