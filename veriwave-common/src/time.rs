//! Timestamp and clock-display utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Format seconds as an `mm:ss` clock string.
///
/// Non-finite or negative input renders as `00:00`, matching what a scrub
/// bar should show before the media duration is known.
pub fn format_clock(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "00:00".to_string();
    }
    let total = secs as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // after 2000-01-01
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0).as_millis(), 0);
        assert_eq!(millis_to_duration(1500).as_millis(), 1500);
    }

    #[test]
    fn test_format_clock_basic() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(7.9), "00:07");
        assert_eq!(format_clock(65.0), "01:05");
        assert_eq!(format_clock(600.0), "10:00");
    }

    #[test]
    fn test_format_clock_unusable_values() {
        assert_eq!(format_clock(f64::NAN), "00:00");
        assert_eq!(format_clock(f64::INFINITY), "00:00");
        assert_eq!(format_clock(-3.0), "00:00");
    }

    #[test]
    fn test_format_clock_over_an_hour() {
        // Minutes keep counting past 59; the display has no hour field
        assert_eq!(format_clock(3725.0), "62:05");
    }
}
