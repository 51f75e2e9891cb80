//! Test reporter - display test results

use colored::*;
use exam_core::{Summary, TestResult, TestStatus};
use serde_json::{json, Value};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Test reporter with output configuration
pub struct TestReporter {
    /// One line per test instead of dots
    verbose: bool,
    /// Disable colored output
    no_color: bool,
    /// Paths are shown relative to this directory
    root: Option<PathBuf>,
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TestReporter {
    /// Create a new test reporter
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            no_color: false,
            root: None,
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    pub fn with_root(mut self, root: Option<&Path>) -> Self {
        self.root = root.map(Path::to_path_buf);
        self
    }

    /// Report test results to stdout
    pub fn report(&self, results: &[TestResult]) -> io::Result<()> {
        if self.no_color {
            colored::control::set_override(false);
        }

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let reported = self.report_to(&mut out, results);

        if self.no_color {
            colored::control::unset_override();
        }
        reported
    }

    /// Report test results to any writer, using the current color setting
    pub fn report_to(&self, out: &mut impl Write, results: &[TestResult]) -> io::Result<()> {
        for result in results {
            self.print_test_result(out, result)?;
        }

        // Dots need a newline before the summary
        if !self.verbose && !results.is_empty() {
            writeln!(out)?;
        }

        writeln!(out)?;
        self.print_summary(out, results)?;
        self.print_failures(out, results)?;
        self.print_exceptions(out, results)
    }

    fn display(&self, result: &TestResult) -> String {
        result
            .relative_script(self.root.as_deref())
            .display()
            .to_string()
    }

    /// Print a single test result
    fn print_test_result(&self, out: &mut impl Write, result: &TestResult) -> io::Result<()> {
        let (label, dot) = match result.status {
            TestStatus::Pass => ("PASS".green().bold(), ".".green()),
            TestStatus::Fail => ("FAIL".red().bold(), "F".red().bold()),
            TestStatus::Exception => ("EXCEPTION".yellow().bold(), "E".yellow().bold()),
        };
        if self.verbose {
            writeln!(out, "{} {}", label, self.display(result))
        } else {
            write!(out, "{}", dot)?;
            out.flush()
        }
    }

    /// Print summary statistics
    fn print_summary(&self, out: &mut impl Write, results: &[TestResult]) -> io::Result<()> {
        let summary = Summary::of(results);

        writeln!(out, "{}", "─".repeat(50))?;

        let status = if summary.all_passed() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };

        writeln!(
            out,
            "Test result: {} | {} total, {} passed, {} failed, {} exceptions",
            status,
            summary.executed.to_string().bold(),
            summary.passed.to_string().green().bold(),
            highlight(summary.failed, |s| s.red().bold()),
            highlight(summary.exceptions, |s| s.yellow().bold()),
        )?;
        writeln!(out, "{}", summary)
    }

    /// Print expected versus actual for every mismatched field
    fn print_failures(&self, out: &mut impl Write, results: &[TestResult]) -> io::Result<()> {
        let failures: Vec<_> = results.iter().filter(|r| r.is_fail()).collect();
        if failures.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", "Failures:".red().bold())?;
        writeln!(out)?;

        for result in failures {
            writeln!(out, "  {} {}", "●".red(), self.display(result).bold())?;
            for mismatch in &result.mismatches {
                writeln!(out, "    {}:", mismatch.field.to_string().bold())?;
                write_block(out, "expected", &mismatch.expected, |s| s.green())?;
                write_block(out, "actual", &mismatch.actual, |s| s.red())?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Print the failure message (and detail) of every exception
    fn print_exceptions(&self, out: &mut impl Write, results: &[TestResult]) -> io::Result<()> {
        let exceptions: Vec<_> = results.iter().filter(|r| r.is_exception()).collect();
        if exceptions.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        writeln!(out, "{}", "Exceptions:".yellow().bold())?;
        writeln!(out)?;

        for result in exceptions {
            writeln!(out, "  {} {}", "●".yellow(), self.display(result).bold())?;
            writeln!(out, "    {}", result.processresult.exception)?;
            for line in result.processresult.exceptiondetail.lines() {
                writeln!(out, "      {}", line.dimmed())?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn highlight(count: usize, style: impl Fn(&str) -> ColoredString) -> ColoredString {
    let text = count.to_string();
    if count > 0 {
        style(&text)
    } else {
        text.normal()
    }
}

fn write_block(
    out: &mut impl Write,
    label: &str,
    text: &str,
    style: impl Fn(&str) -> ColoredString,
) -> io::Result<()> {
    if text.is_empty() {
        return writeln!(out, "      {} {}", format!("{}:", label).dimmed(), "(empty)".dimmed());
    }
    writeln!(out, "      {}", format!("{}:", label).dimmed())?;
    for line in text.lines() {
        writeln!(out, "        {}", style(line))?;
    }
    if !text.ends_with('\n') {
        writeln!(out, "        {}", "(no trailing newline)".dimmed())?;
    }
    Ok(())
}

/// JSON report: counts plus one entry per result
pub fn json_report(results: &[TestResult], root: Option<&Path>) -> Value {
    let summary = Summary::of(results);
    let entries: Vec<Value> = results
        .iter()
        .map(|result| {
            json!({
                "script": result.relative_script(root).display().to_string(),
                "status": result.status,
                "processresult": result.processresult,
                "mismatches": result.mismatches,
            })
        })
        .collect();

    json!({
        "tests": summary.executed,
        "passed": summary.passed,
        "failed": summary.failed,
        "exceptions": summary.exceptions,
        "results": entries,
    })
}
