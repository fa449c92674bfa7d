//! Spinner shown while targets build.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, Stream::Stderr};
use std::time::Duration;

const TICKS: &[&str] = &["◐", "◓", "◑", "◒"];

/// An indeterminate spinner on stderr.
///
/// ```no_run
/// use qoi_cli::ui::Spinner;
///
/// let spinner = Spinner::new("Building targets...");
/// spinner.finish("Targets built");
/// ```
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Start ticking with `message`.
    pub fn new(message: &str) -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        let bar = ProgressBar::new_spinner()
            .with_style(style)
            .with_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Stop with a check mark.
    pub fn finish(&self, message: &str) {
        self.stop("✓".if_supports_color(Stderr, |s| s.green()).to_string(), message);
    }

    /// Stop with a cross.
    pub fn fail(&self, message: &str) {
        self.stop("✗".if_supports_color(Stderr, |s| s.red()).to_string(), message);
    }

    fn stop(&self, mark: String, message: &str) {
        self.bar.finish_with_message(format!("{mark} {message}"));
    }
}
