//! Human-readable sizes, durations and the end-of-build file table.

use console::Term;
use owo_colors::{OwoColorize, Stream::Stderr};
use std::time::Duration;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// `1536` → `"1.50 KB"`. Whole bytes are printed without decimals.
///
/// ```
/// use qoi_cli::ui::format_size;
///
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    match unit {
        0 => format!("{bytes} B"),
        _ => format!("{value:.2} {}", SIZE_UNITS[unit]),
    }
}

/// Milliseconds under a second, fractional seconds under a minute, else
/// minutes and seconds.
///
/// ```
/// use std::time::Duration;
/// use qoi_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    match duration.as_millis() {
        ms @ 0..1_000 => format!("{ms}ms"),
        1_000..60_000 => format!("{:.2}s", duration.as_secs_f64()),
        _ => {
            let secs = duration.as_secs();
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}

/// Print the files a build produced, with their sizes, to stderr.
///
/// ```no_run
/// use std::time::Duration;
/// use qoi_cli::ui::print_build_summary;
///
/// print_build_summary(
///     &[("dist/y.js".to_string(), 15_234), ("dist/package.json".to_string(), 412)],
///     Duration::from_millis(450),
/// );
/// ```
pub fn print_build_summary(entries: &[(String, u64)], elapsed: Duration) {
    let rule = "─".repeat(usize::from(Term::stderr().size().1).min(80));
    let name_width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    eprintln!();
    eprintln!("{rule}");
    for (name, size) in entries {
        eprintln!(
            "  {:<name_width$}  {}",
            name,
            format_size(*size).if_supports_color(Stderr, |s| s.dimmed())
        );
    }
    eprintln!("{rule}");

    let total: u64 = entries.iter().map(|(_, size)| size).sum();
    eprintln!(
        "  {} file(s), {} in {}",
        entries.len(),
        format_size(total).if_supports_color(Stderr, |s| s.green()),
        format_duration(elapsed).if_supports_color(Stderr, |s| s.green())
    );
}
