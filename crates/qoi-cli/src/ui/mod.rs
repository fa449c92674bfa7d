//! Terminal UI utilities for status lines, spinners and build summaries.
//!
//! ```no_run
//! use qoi_cli::ui;
//!
//! ui::init_colors(false);
//!
//! let spinner = ui::Spinner::new("Building targets...");
//! spinner.finish("Targets built");
//!
//! ui::success("Build successful");
//! ui::error("Failed to parse file");
//! ```

mod format;
mod messages;
mod spinner;

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};
pub use spinner::Spinner;

/// Check if running in a CI environment.
///
/// Detects common CI environment variables from GitHub Actions, GitLab CI,
/// CircleCI, and Travis CI.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR environment variables, falls back to
/// terminal capability detection.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Whether interactive widgets (spinners) should be drawn.
pub fn is_interactive() -> bool {
    !is_ci() && console::user_attended_stderr()
}

/// Initialize color support from the environment and `--no-color`.
///
/// `owo-colors` already honors NO_COLOR; this turns colors off globally when
/// the environment or the flag asks for it.
pub fn init_colors(no_color: bool) {
    if no_color || !should_use_color() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
        owo_colors::set_override(false);
    }
}
