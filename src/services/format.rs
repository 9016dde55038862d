//! Human-readable sizes and durations for CLI output

use std::time::Duration;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count using binary multiples (`1.5 KB`, `3.0 GB`).
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.1} {}", UNITS[unit])
}

/// Format an elapsed time: `12.3 seconds`, `2m 5.0s`, `1h 2m 3.0s`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    if total < 60.0 {
        return format!("{total:.1} seconds");
    }

    let whole_minutes = elapsed.as_secs() / 60;
    #[allow(clippy::cast_precision_loss)]
    let seconds = total - (whole_minutes * 60) as f64;
    if whole_minutes < 60 {
        return format!("{whole_minutes}m {seconds:.1}s");
    }

    let hours = whole_minutes / 60;
    let minutes = whole_minutes % 60;
    format!("{hours}h {minutes}m {seconds:.1}s")
}
