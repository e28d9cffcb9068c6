//! Time readout formatting

/// Formats seconds as `MM:SS`.
///
/// Minutes and seconds are zero-padded to two digits; minutes grow past two
/// digits when needed. Negative, NaN and infinite inputs render as `00:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Fraction of `time` within `duration`, 0 when duration is unknown or zero
pub fn progress_fraction(time: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d > 0.0 && d.is_finite() => (time / d).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(3599.0), "59:59");
        assert_eq!(format_time(59.999), "00:59");
    }

    #[test]
    fn test_format_time_past_an_hour() {
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(6000.5), "100:00");
    }

    #[test]
    fn test_format_time_invalid() {
        assert_eq!(format_time(-3.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(f64::INFINITY), "00:00");
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(30.0, Some(120.0)), 0.25);
        assert_eq!(progress_fraction(30.0, None), 0.0);
        assert_eq!(progress_fraction(30.0, Some(0.0)), 0.0);
        assert_eq!(progress_fraction(200.0, Some(120.0)), 1.0);
    }
}
