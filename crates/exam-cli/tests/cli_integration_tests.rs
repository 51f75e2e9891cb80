//! CLI integration tests
//!
//! Every command runs with HOME pointed at a scratch directory so the user's
//! global configuration is never read or written. Tests that execute code
//! use `/bin/sh` as the interpreter.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn exam_cmd(home: &Path, cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("exam").unwrap();
    cmd.current_dir(cwd)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env("EXAM_NO_PROGRESS", "1")
        .env_remove("EXAM_INTERPRETER")
        .env_remove("EXAM_ENTRY_FILE")
        .env_remove("EXAM_TIMEOUT")
        .env_remove("EXAM_SCRIPT_ROOT")
        .env_remove("EXAM_JSON")
        .env_remove("EXAM_LOG");
    cmd
}

struct Sandbox {
    home: TempDir,
    work: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        exam_cmd(self.home.path(), self.work.path())
    }

    fn path(&self, relative: &str) -> std::path::PathBuf {
        self.work.path().join(relative)
    }

    fn definition(&self, relative: &str, code: &str, stdout: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let document = json!({
            "description": relative,
            "code": [{"name": "main.x", "code": code}],
            "stdin": "",
            "expected": {"stdout": stdout, "stderr": "", "returncode": "0"}
        });
        fs::write(path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// HELP MESSAGE TESTS
// ══════════════════════════════════════════════════════════════════════════════

mod help_messages {
    use super::*;

    #[test]
    fn test_main_help_shows_all_commands() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("test"))
            .stdout(predicate::str::contains("run"))
            .stdout(predicate::str::contains("record"))
            .stdout(predicate::str::contains("new"))
            .stdout(predicate::str::contains("config"))
            .stdout(predicate::str::contains("completions"));
    }

    #[test]
    fn test_main_help_shows_examples_and_environment() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("EXAMPLES"))
            .stdout(predicate::str::contains("ENVIRONMENT VARIABLES"))
            .stdout(predicate::str::contains("EXAM_INTERPRETER"));
    }

    #[test]
    fn test_test_help_lists_flags() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["test", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--sequential"))
            .stdout(predicate::str::contains("--json"))
            .stdout(predicate::str::contains("--interpreter"))
            .stdout(predicate::str::contains("--filter"));
    }

    #[test]
    fn test_completions_generate() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("exam"));
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// TEST COMMAND
// ══════════════════════════════════════════════════════════════════════════════

#[cfg(unix)]
mod test_command {
    use super::*;

    #[test]
    fn test_all_passing() {
        let sandbox = Sandbox::new();
        sandbox.definition("suite/a.json", "echo a", "a\n");
        sandbox.definition("suite/nested/b.json", "echo b", "b\n");

        sandbox
            .cmd()
            .args(["test", "suite", "-v", "--interpreter", "/bin/sh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("PASS a.json"))
            .stdout(predicate::str::contains("PASS nested/b.json"))
            .stdout(predicate::str::contains("2 tests executed, 0 failed"));
    }

    #[test]
    fn test_failure_exits_with_one() {
        let sandbox = Sandbox::new();
        sandbox.definition("suite/a.json", "echo a", "a\n");
        sandbox.definition("suite/b.json", "echo b", "not b\n");

        sandbox
            .cmd()
            .args(["test", "suite", "-v", "--interpreter", "/bin/sh"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("FAIL b.json"))
            .stdout(predicate::str::contains("Failures:"))
            .stdout(predicate::str::contains("not b"))
            .stdout(predicate::str::contains("2 tests executed, 1 failed"));
    }

    #[test]
    fn test_exception_reported() {
        let sandbox = Sandbox::new();
        fs::create_dir_all(sandbox.path("suite")).unwrap();
        fs::write(sandbox.path("suite/broken.json"), r#"{"description": 1}"#).unwrap();

        sandbox
            .cmd()
            .args(["test", "suite", "--interpreter", "/bin/sh"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Exceptions:"))
            .stdout(predicate::str::contains("Schema TypeMismatch"));
    }

    #[test]
    fn test_json_report() {
        let sandbox = Sandbox::new();
        sandbox.definition("suite/a.json", "echo a", "a\n");
        sandbox.definition("suite/b.json", "exit 3", "");

        let output = sandbox
            .cmd()
            .args(["test", "suite", "--json", "--interpreter", "/bin/sh"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let report: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["tests"], 2);
        assert_eq!(report["passed"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["exceptions"], 0);
        assert_eq!(report["results"][1]["script"], "b.json");
        assert_eq!(report["results"][1]["processresult"]["returncode"], "3");
    }

    #[test]
    fn test_filter() {
        let sandbox = Sandbox::new();
        sandbox.definition("suite/lists/append.json", "echo a", "a\n");
        sandbox.definition("suite/maps/insert.json", "echo b", "wrong\n");

        sandbox
            .cmd()
            .args(["test", "suite", "-v", "--filter", "lists", "-i", "/bin/sh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 tests executed, 0 failed"));
    }

    #[test]
    fn test_timeout_flag() {
        let sandbox = Sandbox::new();
        sandbox.definition("suite/spin.json", "while :; do :; done", "");

        sandbox
            .cmd()
            .args(["test", "suite", "--timeout", "1", "-i", "/bin/sh"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("command timed out after 1 seconds"));
    }

    #[test]
    fn test_no_tests_found() {
        let sandbox = Sandbox::new();
        fs::create_dir_all(sandbox.path("empty")).unwrap();

        sandbox
            .cmd()
            .args(["test", "empty", "-i", "/bin/sh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No tests found"));
    }

    #[test]
    fn test_project_config_supplies_settings() {
        let sandbox = Sandbox::new();
        fs::write(
            sandbox.path("exam.toml"),
            "[interpreter]\npath = \"/bin/sh\"\n\n[suite]\nroot = \"definitions\"\n",
        )
        .unwrap();
        sandbox.definition("definitions/a.json", "echo a", "a\n");

        sandbox
            .cmd()
            .args(["test", "-v"])
            .assert()
            .success()
            .stdout(predicate::str::contains("PASS a.json"));
    }

    #[test]
    fn test_env_interpreter() {
        let sandbox = Sandbox::new();
        sandbox.definition("suite/a.json", "echo a", "a\n");

        sandbox
            .cmd()
            .env("EXAM_INTERPRETER", "/bin/sh")
            .args(["test", "suite"])
            .assert()
            .success();
    }
}

#[test]
fn test_missing_interpreter_configuration() {
    let sandbox = Sandbox::new();
    sandbox.definition("suite/a.json", "echo a", "a\n");

    sandbox
        .cmd()
        .args(["test", "suite"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No interpreter configured"));
}

#[test]
fn test_missing_path() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["test", "nowhere", "-i", "/bin/sh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Test path not found"));
}

// ══════════════════════════════════════════════════════════════════════════════
// RUN / RECORD / NEW
// ══════════════════════════════════════════════════════════════════════════════

#[cfg(unix)]
#[test]
fn test_run_prints_output() {
    let sandbox = Sandbox::new();
    sandbox.definition("a.json", "echo hello; echo oops >&2; exit 5", "");

    sandbox
        .cmd()
        .args(["run", "a.json", "-i", "/bin/sh"])
        .assert()
        .success()
        .stdout("hello\n")
        .stderr(predicate::str::contains("oops"))
        .stderr(predicate::str::contains("Return code: 5"));
}

#[test]
fn test_run_reports_missing_interpreter() {
    let sandbox = Sandbox::new();
    sandbox.definition("a.json", "echo hello", "");

    sandbox
        .cmd()
        .args(["run", "a.json", "-i", "/nonexistent/exin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "interpreter /nonexistent/exin not found",
        ));
}

#[cfg(unix)]
#[test]
fn test_new_record_then_test() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["new", "suite/greet.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let path = sandbox.path("suite/greet.json");
    let mut document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["code"][0]["name"], "main.x");
    document["code"][0]["code"] = json!("echo hi");
    fs::write(&path, document.to_string()).unwrap();

    sandbox
        .cmd()
        .args(["record", "suite/greet.json", "-i", "/bin/sh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded"));

    let recorded: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(recorded["expected"]["stdout"], "hi\n");
    assert!(fs::read_to_string(&path).unwrap().contains("\n    \"description\""));

    sandbox
        .cmd()
        .args(["test", "suite", "-i", "/bin/sh"])
        .assert()
        .success();
}

#[test]
fn test_new_rejects_bad_names_and_existing_files() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["new", "bad-name.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid definition name"));

    fs::write(sandbox.path("taken.json"), "{}").unwrap();
    sandbox
        .cmd()
        .args(["new", "taken.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(sandbox.path("taken.json")).unwrap(), "{}");
}

// ══════════════════════════════════════════════════════════════════════════════
// CONFIG COMMAND
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_config_set_and_show() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["config", "set", "interpreter", "/opt/exin/bin/exin"])
        .assert()
        .success();

    assert!(sandbox.home.path().join(".exam/config.toml").is_file());

    sandbox
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/opt/exin/bin/exin"))
        .stdout(predicate::str::contains("main.x"))
        .stdout(predicate::str::contains("5s"));
}

#[test]
fn test_config_path() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".exam"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_invalid_project_config_reported() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.path("exam.toml"), "[interpreter]\ntimeout = 0\n").unwrap();

    sandbox
        .cmd()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
