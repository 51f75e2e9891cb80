//! Test result presentation

pub mod progress;
pub mod reporter;

pub use progress::TestProgress;
pub use reporter::{json_report, TestReporter};
