//! Progress bar shown on stderr while definitions run

use exam_core::{TestResult, TestStatus};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}";

/// Counts completed tests; safe to update from worker threads
pub struct TestProgress {
    bar: ProgressBar,
}

impl TestProgress {
    /// A bar over `total` tests, drawn only when `enabled`
    pub fn new(total: usize, enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_length(total as u64);
        Self { bar }
    }

    /// Record one finished test
    pub fn observe(&self, result: &TestResult) {
        if result.status != TestStatus::Pass {
            self.bar.set_message(format!(
                "{} {}",
                result.status,
                result
                    .script
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ));
        }
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Remove the bar before the report is printed
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
