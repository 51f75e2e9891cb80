//! End-to-end engine tests with `/bin/sh` standing in for the interpreter

#![cfg(unix)]

use exam_core::{
    run_single_test, run_tests, run_tests_with, CancellationToken, Isolation, OutputField,
    RunConfig, TestStatus,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::{tempdir, TempDir};

fn write_definition(path: &Path, code: &str, stdin: &str, stdout: &str, returncode: &str) {
    let document = json!({
        "description": "generated",
        "code": [{"name": "main.x", "code": code}],
        "stdin": stdin,
        "expected": {"stdout": stdout, "stderr": "", "returncode": returncode}
    });
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
}

fn sh() -> RunConfig {
    RunConfig::new("/bin/sh")
}

fn suite() -> TempDir {
    tempdir().unwrap()
}

#[test]
fn test_matching_output_passes() {
    let dir = suite();
    let script = dir.path().join("add.json");
    write_definition(&script, "echo 2", "", "2\n", "0");

    let result = run_single_test(&script, &sh());
    assert_eq!(result.status, TestStatus::Pass);
    assert_eq!(result.processresult.stdout, "2\n");
    assert_eq!(result.processresult.returncode, "0");
}

#[test]
fn test_mismatch_fails_and_keeps_actual_output() {
    let dir = suite();
    let script = dir.path().join("add.json");
    write_definition(&script, "echo 2", "", "3\n", "0");

    let result = run_single_test(&script, &sh());
    assert_eq!(result.status, TestStatus::Fail);
    assert_eq!(result.processresult.stdout, "2\n");
    assert_eq!(result.mismatches.len(), 1);
    assert_eq!(result.mismatches[0].field, OutputField::Stdout);
    assert_eq!(result.mismatches[0].expected, "3\n");
}

#[test]
fn test_returncode_compared_as_string() {
    let dir = suite();
    let script = dir.path().join("exit.json");
    write_definition(&script, "exit 2", "", "", "02");

    let result = run_single_test(&script, &sh());
    assert_eq!(result.status, TestStatus::Fail);
    assert_eq!(result.processresult.returncode, "2");
}

#[test]
fn test_stdin_is_fed_to_interpreter() {
    let dir = suite();
    let script = dir.path().join("echo.json");
    write_definition(&script, "read line; echo \"<$line>\"", "hi\n", "<hi>\n", "0");

    assert!(run_single_test(&script, &sh()).is_pass());
}

#[test]
fn test_missing_interpreter_is_exception() {
    let dir = suite();
    let script = dir.path().join("add.json");
    write_definition(&script, "echo 2", "", "2\n", "0");

    let result = run_single_test(&script, &RunConfig::new("/nonexistent/exin"));
    assert_eq!(result.status, TestStatus::Exception);
    assert_eq!(
        result.processresult.exception,
        "interpreter /nonexistent/exin not found"
    );
}

#[test]
fn test_timeout_is_exception_and_names_bound() {
    let dir = suite();
    let script = dir.path().join("spin.json");
    write_definition(&script, "while :; do :; done", "", "", "0");

    let config = sh().with_timeout(Duration::from_secs(1));
    let started = Instant::now();
    let result = run_single_test(&script, &config);

    assert_eq!(result.status, TestStatus::Exception);
    assert_eq!(
        result.processresult.exception,
        "command timed out after 1 seconds"
    );
    assert!(result.processresult.stdout.is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_timeout_leaves_no_interpreter_running() {
    let dir = suite();
    let scratch = tempdir().unwrap();
    let pid_file = scratch.path().join("pid");
    let script = dir.path().join("spin.json");
    write_definition(
        &script,
        &format!("echo $$ > '{}'\nwhile :; do :; done\n", pid_file.display()),
        "",
        "",
        "0",
    );

    let result = run_single_test(&script, &sh().with_timeout(Duration::from_secs(1)));
    assert_eq!(result.status, TestStatus::Exception);

    let pid = fs::read_to_string(&pid_file).unwrap();
    let pid = pid.trim();
    assert!(!pid.is_empty());
    assert!(!process_alive(pid), "interpreter {} still running", pid);
}

fn process_alive(pid: &str) -> bool {
    std::process::Command::new("kill")
        .args(["-0", pid])
        .stderr(std::process::Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[test]
fn test_background_process_cannot_outlive_timeout() {
    let dir = suite();
    let script = dir.path().join("daemon.json");
    write_definition(&script, "sleep 8 & echo hi", "", "hi\n", "0");

    let started = Instant::now();
    let result = run_single_test(&script, &sh().with_timeout(Duration::from_secs(1)));

    assert_eq!(result.status, TestStatus::Exception);
    assert_eq!(
        result.processresult.exception,
        "command timed out after 1 seconds"
    );
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_schema_violation_runs_nothing() {
    let dir = suite();
    let workdir = tempdir().unwrap();
    let script = dir.path().join("broken.json");
    let document = json!({
        "description": "no stdin",
        "code": [{"name": "main.x", "code": "touch ran"}],
        "expected": {"stdout": "", "stderr": "", "returncode": "0"}
    });
    fs::write(&script, document.to_string()).unwrap();

    let config = sh().with_isolation(Isolation::Shared(workdir.path().to_path_buf()));
    let result = run_single_test(&script, &config);

    assert_eq!(result.status, TestStatus::Exception);
    assert_eq!(result.processresult.exception, "Schema MissingField");
    assert!(result.processresult.exceptiondetail.contains("'stdin'"));
    assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_json_names_relative_path() {
    let dir = suite();
    let script = dir.path().join("lists/bad.json");
    fs::create_dir_all(script.parent().unwrap()).unwrap();
    fs::write(&script, "{ nope").unwrap();

    let config = sh().with_script_root(dir.path());
    let result = run_single_test(&script, &config);
    assert!(result.is_exception());
    assert!(result
        .processresult
        .exception
        .starts_with("ValueError while loading lists/bad.json: "));
}

#[test]
fn test_shared_directory_is_cleaned_on_every_path() {
    let dir = suite();
    let workdir = tempdir().unwrap();
    fs::write(workdir.path().join("keep.txt"), "untouched").unwrap();
    let config = sh()
        .with_isolation(Isolation::Shared(workdir.path().to_path_buf()))
        .with_timeout(Duration::from_secs(1));

    write_definition(&dir.path().join("pass.json"), "echo ok", "", "ok\n", "0");
    write_definition(&dir.path().join("fail.json"), "echo ok", "", "nope", "0");
    write_definition(&dir.path().join("spin.json"), "while :; do :; done", "", "", "0");

    let results = run_tests(dir.path(), &config);
    let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![TestStatus::Fail, TestStatus::Pass, TestStatus::Exception]
    );

    let remaining: Vec<PathBuf> = fs::read_dir(workdir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(remaining, vec![workdir.path().join("keep.txt")]);
}

#[test]
fn test_sources_are_visible_to_interpreter() {
    let dir = suite();
    let script = dir.path().join("multi.json");
    let document = json!({
        "description": "two files",
        "code": [
            {"name": "main.x", "code": ". ./lib.x; greet"},
            {"name": "lib.x", "code": "greet() { echo hello; }"},
            {"name": "", "code": "placeholder"}
        ],
        "stdin": "",
        "expected": {"stdout": "hello\n", "stderr": "", "returncode": "0"}
    });
    fs::write(&script, document.to_string()).unwrap();

    assert!(run_single_test(&script, &sh()).is_pass());
}

#[test]
fn test_discovery_returns_one_result_per_definition() {
    let dir = suite();
    let root = dir.path();
    write_definition(&root.join("a.json"), "echo a", "", "a\n", "0");
    write_definition(&root.join("nested/b.json"), "echo b", "", "b\n", "0");
    write_definition(&root.join("nested/deeper/c.json"), "exit 1", "", "", "0");
    fs::write(root.join("nested/notes.txt"), "not a test").unwrap();
    fs::write(root.join("nested/deeper/broken.json"), "[]").unwrap();

    let results = run_tests(root, &sh());
    assert_eq!(results.len(), 4);
    let passed = results.iter().filter(|r| r.is_pass()).count();
    assert_eq!(passed, 2);
}

#[test]
fn test_parallel_results_keep_discovery_order() {
    let dir = suite();
    for i in 0..12 {
        let delay = if i % 2 == 0 { "0.2" } else { "0" };
        write_definition(
            &dir.path().join(format!("t{:02}.json", i)),
            &format!("sleep {}; echo {}", delay, i),
            "",
            &format!("{}\n", i),
            "0",
        );
    }

    let seen = Mutex::new(0usize);
    let results = run_tests_with(dir.path(), &sh(), &CancellationToken::new(), |_| {
        *seen.lock().unwrap() += 1;
    });

    assert_eq!(*seen.lock().unwrap(), 12);
    let names: Vec<_> = results
        .iter()
        .map(|r| r.script.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    let expected: Vec<_> = (0..12).map(|i| format!("t{:02}.json", i)).collect();
    assert_eq!(names, expected);
    assert!(results.iter().all(|r| r.is_pass()));
}

#[test]
fn test_cancellation_stops_batch() {
    let dir = suite();
    for i in 0..3 {
        write_definition(
            &dir.path().join(format!("spin{}.json", i)),
            "while :; do :; done",
            "",
            "",
            "0",
        );
    }
    let config = sh()
        .with_parallel(false)
        .with_timeout(Duration::from_secs(30));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.cancel();
    });

    let started = Instant::now();
    let results = run_tests_with(dir.path(), &config, &cancel, |_| {});
    handle.join().unwrap();

    assert!(results.is_empty());
    assert!(started.elapsed() < Duration::from_secs(10));
}
