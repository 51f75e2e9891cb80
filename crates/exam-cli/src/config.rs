//! CLI presentation settings from environment variables
//!
//! Interpreter and suite settings live in exam-config; this only covers how
//! output is rendered.

use std::env;

/// Output settings loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Disable colored output (EXAM_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Hide the progress bar during test runs (EXAM_NO_PROGRESS=1)
    pub no_progress: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: is_set("EXAM_NO_COLOR") || is_set("NO_COLOR"),
            no_progress: is_set("EXAM_NO_PROGRESS"),
        }
    }

    /// Apply the color setting to the `colored` crate
    pub fn apply_color(&self, force_off: bool) {
        if self.no_color || force_off {
            colored::control::set_override(false);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Set and not an explicit "off" value
fn is_set(name: &str) -> bool {
    env::var(name)
        .map(|v| {
            let lower = v.to_lowercase();
            !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off")
        })
        .unwrap_or(false)
}
