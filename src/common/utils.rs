use std::time::Duration;

/// Render an elapsed duration as `1h 02m 03s`, `2m 03s` or `3.21s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

/// Bytes to gibibytes, for memory estimates in log lines.
pub fn bytes_to_gib(bytes: usize) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}
