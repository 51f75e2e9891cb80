//! Source materialization
//!
//! Source files exist on disk only while one execution is in flight.
//! [`Materialized`] removes every file it wrote when dropped, whatever path
//! the caller takes out of the execution. Removal failures are logged and
//! otherwise ignored.

use crate::config::Isolation;
use crate::definition::SourceFile;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Working directory for one execution
#[derive(Debug)]
pub enum Workspace {
    Shared(PathBuf),
    /// Removed together with its contents on drop
    Isolated(TempDir),
}

impl Workspace {
    pub fn acquire(isolation: &Isolation) -> io::Result<Self> {
        match isolation {
            Isolation::Shared(dir) => Ok(Workspace::Shared(dir.clone())),
            Isolation::Isolated => {
                let dir = tempfile::Builder::new().prefix("exam-").tempdir()?;
                debug!(dir = %dir.path().display(), "created isolated workspace");
                Ok(Workspace::Isolated(dir))
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Workspace::Shared(dir) => dir,
            Workspace::Isolated(dir) => dir.path(),
        }
    }
}

/// Files written into a directory for the span of one execution
#[derive(Debug)]
pub struct Materialized {
    dir: PathBuf,
    created: Vec<PathBuf>,
}

impl Materialized {
    /// Write every named source file into `dir`, overwriting existing files.
    ///
    /// Entries with an empty name are skipped. If a write fails, the files
    /// written so far are removed before the error is returned.
    pub fn write(dir: &Path, files: &[SourceFile]) -> io::Result<Self> {
        let mut materialized = Materialized {
            dir: dir.to_path_buf(),
            created: Vec::new(),
        };

        for file in files {
            if file.name.is_empty() {
                continue;
            }
            check_file_name(&file.name)?;
            let path = dir.join(&file.name);
            // Tracked before writing so a partial write is cleaned up too
            materialized.created.push(path.clone());
            fs::write(&path, &file.code)?;
            debug!(file = %path.display(), bytes = file.code.len(), "materialized source");
        }

        Ok(materialized)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.created
    }
}

impl Drop for Materialized {
    fn drop(&mut self) {
        for path in self.created.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(file = %path.display(), "removed source"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(file = %path.display(), error = %e, "failed to remove source"),
            }
        }
    }
}

/// Source names are plain file names; anything that could land outside the
/// working directory is rejected.
fn check_file_name(name: &str) -> io::Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid source file name '{}'", name),
        )),
    }
}
