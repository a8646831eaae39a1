//! Progress indication while a turn is in flight

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Spinner shown while waiting for the first byte of a reply.
///
/// Throttling backoffs can last a minute or more, so the spinner keeps the
/// elapsed time visible.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Start a spinner for a call to `model_id`.
    pub fn start(model_id: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_prefix(model_id.to_string());
        bar.set_message("waiting for reply");
        bar.enable_steady_tick(TICK);
        Self { bar }
    }

    /// A reporter that draws nothing (for `--quiet` and non-interactive output).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn for_mode(model_id: &str, quiet: bool) -> Self {
        if quiet {
            Self::hidden()
        } else {
            Self::start(model_id)
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Remove the spinner before the reply is printed.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Replace the spinner with a failure line.
    pub fn fail(&self, message: &str) {
        self.bar
            .finish_with_message(format!("{} {}", "failed:".red(), message));
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
