//! Formatting helpers for terminal output.

use std::time::Duration;

/// Format a duration for request and compile timing.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hotbox_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_micros(250)), "0.25ms");
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms == 0 {
        format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
    } else if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
