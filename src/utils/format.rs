//! Human-readable time formatting

use std::time::Duration;

/// Format a countdown as `MM:SS`.
///
/// Minutes are not wrapped into hours and sub-second precision is dropped,
/// so 90 minutes renders as `90:00`.
pub fn format_clock(remaining: Duration) -> String {
    let total_seconds = remaining.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_minutes_and_seconds() {
        assert_eq!(format_clock(Duration::ZERO), "00:00");
        assert_eq!(format_clock(Duration::from_secs(65)), "01:05");
        assert_eq!(format_clock(Duration::from_secs(25 * 60)), "25:00");
    }

    #[test]
    fn truncates_fractions_and_keeps_long_minutes() {
        assert_eq!(format_clock(Duration::from_millis(59_999)), "00:59");
        assert_eq!(format_clock(Duration::from_secs(125 * 60)), "125:00");
    }
}
