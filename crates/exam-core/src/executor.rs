//! Process execution under a hard timeout
//!
//! The interpreter is started as `<interpreter> <entry file>` in the working
//! directory holding the materialized sources. Stdin is written and
//! stdout/stderr are drained on helper threads so a chatty process can never
//! block on a full pipe. The parent polls for exit until the deadline; on
//! timeout or cancellation the child is killed and reaped before returning.
//! Output collection shares the same deadline, so a background process that
//! keeps the pipes open cannot hold the run past its timeout.

use crate::cancel::CancellationToken;
use crate::config::format_seconds;
use crate::error::{ExecError, ExecResult};
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

const TRUNCATION_MARKER: &str = "\n[...truncated...]\n";

/// Parameters of one interpreter invocation
#[derive(Debug, Clone)]
pub struct ExecRequest<'a> {
    pub interpreter: &'a Path,
    pub entry_file: &'a str,
    pub stdin: &'a str,
    pub timeout: Duration,
    pub cwd: &'a Path,
    pub max_capture_bytes: usize,
}

/// Output of an interpreter that exited on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    /// Exit code as signed 32-bit; `-N` when killed by signal N
    pub code: i32,
}

enum Waited {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

type Reader = Receiver<io::Result<(Vec<u8>, bool)>>;

/// Run the interpreter and capture its output
///
/// # Errors
///
/// Returns the classified failure: timeout, interpreter not found, OS
/// failure, internal error, or cancellation.
pub fn execute(request: &ExecRequest<'_>, cancel: &CancellationToken) -> ExecResult<Captured> {
    let program = resolve_program(request.interpreter);
    let deadline = Instant::now() + request.timeout;
    let mut child = Command::new(&program)
        .arg(request.entry_file)
        .current_dir(request.cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExecError::spawn(e, request.interpreter))?;
    debug!(
        pid = child.id(),
        interpreter = %program.display(),
        entry = request.entry_file,
        "spawned interpreter"
    );

    let (stdout, stderr) = match take_readers(&mut child, request) {
        Ok(readers) => readers,
        Err(e) => {
            kill_and_reap(&mut child);
            return Err(e);
        }
    };

    let status = match wait_with_deadline(&mut child, deadline, cancel) {
        Ok(Waited::Exited(status)) => status,
        Ok(Waited::TimedOut) => {
            // Readers are left to finish on their own; the output is discarded
            kill_and_reap(&mut child);
            return Err(ExecError::Timeout {
                seconds: format_seconds(request.timeout),
            });
        }
        Ok(Waited::Cancelled) => {
            kill_and_reap(&mut child);
            return Err(ExecError::Cancelled);
        }
        Err(e) => {
            kill_and_reap(&mut child);
            return Err(ExecError::os(e));
        }
    };

    let code = normalize_exit_code(status);
    debug!(pid = child.id(), code, "interpreter exited");

    Ok(Captured {
        stdout: collect(&stdout, "stdout", deadline, request.timeout)?,
        stderr: collect(&stderr, "stderr", deadline, request.timeout)?,
        code,
    })
}

/// Relative interpreter paths with a directory part are resolved against the
/// current directory, not the child's working directory. Bare names are left
/// for the PATH lookup.
fn resolve_program(interpreter: &Path) -> PathBuf {
    if interpreter.is_absolute() || interpreter.components().count() < 2 {
        return interpreter.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(interpreter))
        .unwrap_or_else(|_| interpreter.to_path_buf())
}

fn take_readers(child: &mut Child, request: &ExecRequest<'_>) -> ExecResult<(Reader, Reader)> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ExecError::internal("stdin pipe missing"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::internal("stdout pipe missing"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::internal("stderr pipe missing"))?;

    let input = request.stdin.to_owned();
    thread::spawn(move || {
        // The interpreter may exit without reading its input
        if let Err(e) = stdin.write_all(input.as_bytes()) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                warn!(error = %e, "failed to write interpreter stdin");
            }
        }
        // Dropping the pipe closes the child's stdin
    });

    let limit = request.max_capture_bytes;
    Ok((spawn_reader(stdout, limit), spawn_reader(stderr, limit)))
}

/// Drain a pipe on its own thread; the result arrives on the returned channel
fn spawn_reader(pipe: impl Read + Send + 'static, limit: usize) -> Reader {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        // The receiver is gone once the run has given up on this stream
        let _ = sender.send(read_limited(pipe, limit));
    });
    receiver
}

fn wait_with_deadline(
    child: &mut Child,
    deadline: Instant,
    cancel: &CancellationToken,
) -> io::Result<Waited> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Waited::Exited(status));
        }
        if cancel.is_cancelled() {
            return Ok(Waited::Cancelled);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(Waited::TimedOut);
        }
        thread::sleep(POLL_INTERVAL.min(remaining));
    }
}

fn kill_and_reap(child: &mut Child) {
    let pid = child.id();
    if let Err(e) = child.kill() {
        // Already exited between the last poll and the kill
        debug!(pid, error = %e, "kill failed");
    }
    match child.wait() {
        Ok(status) => debug!(pid, ?status, "reaped interpreter"),
        Err(e) => warn!(pid, error = %e, "failed to reap interpreter"),
    }
}

/// Exit code as a signed 32-bit value, so codes compare the same on every
/// platform. A process killed by a signal reports the negated signal number.
fn normalize_exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Wait for a reader until the deadline. A reader still blocked then is
/// detached, as on timeout.
fn collect(
    reader: &Reader,
    stream: &str,
    deadline: Instant,
    timeout: Duration,
) -> ExecResult<String> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    let (bytes, truncated) = match reader.recv_timeout(remaining) {
        Ok(read) => read.map_err(ExecError::os)?,
        Err(RecvTimeoutError::Timeout) => {
            warn!(stream, "interpreter exited but its output pipe stayed open");
            return Err(ExecError::Timeout {
                seconds: format_seconds(timeout),
            });
        }
        Err(RecvTimeoutError::Disconnected) => {
            return Err(ExecError::internal(format!("{} reader panicked", stream)))
        }
    };
    let mut text = decode(&bytes);
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }
    Ok(text)
}

/// Captured bytes as text: lossy UTF-8 with `\r\n` line endings normalized
fn decode(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.contains("\r\n") {
        text.replace("\r\n", "\n")
    } else {
        text.into_owned()
    }
}

fn read_limited(mut reader: impl Read, limit: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut buffer = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        append_limited(&mut buffer, &chunk[..read], limit, &mut truncated);
    }
    Ok((buffer, truncated))
}

/// Append while keeping only the last `limit` bytes
fn append_limited(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize, truncated: &mut bool) {
    if buffer.len().saturating_add(chunk.len()) <= limit {
        buffer.extend_from_slice(chunk);
        return;
    }
    *truncated = true;
    if chunk.len() >= limit {
        buffer.clear();
        buffer.extend_from_slice(&chunk[chunk.len() - limit..]);
        return;
    }
    let excess = buffer.len() + chunk.len() - limit;
    buffer.drain(..excess);
    buffer.extend_from_slice(chunk);
}
