//! Conversions between `MM:SS` strings, seconds and milliseconds.

use crate::error::SplitError;

/// Format a number of seconds as `MM:SS`.
///
/// Fractions are truncated and minutes keep growing past 59, so an hour and a
/// half renders as `90:00`. Negative or non-finite input renders as `00:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Parse an `MM:SS` string into seconds.
///
/// Minutes are one or more ASCII digits, seconds exactly two digits in
/// `00..=59`. Anything else, including the empty string, is
/// [`SplitError::InvalidFormat`].
pub fn parse_time(value: &str) -> Result<f64, SplitError> {
    let invalid = || SplitError::InvalidFormat {
        input: value.to_owned(),
    };

    let (minutes, seconds) = value.split_once(':').ok_or_else(invalid)?;
    if minutes.is_empty() || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let secs = seconds.as_bytes();
    if secs.len() != 2 || !(b'0'..=b'5').contains(&secs[0]) || !secs[1].is_ascii_digit() {
        return Err(invalid());
    }

    let minutes = minutes.parse::<u64>().map_err(|_| invalid())?;
    let seconds = u64::from((secs[0] - b'0') * 10 + (secs[1] - b'0'));
    let total = minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(invalid)?;

    Ok(total as f64)
}

/// Check a pair of `MM:SS` strings against the duration of the loaded audio.
pub fn validate_time_range(
    start: &str,
    end: &str,
    total_duration_seconds: f64,
) -> Result<(), SplitError> {
    let start_seconds = parse_time(start)?;
    let end_seconds = parse_time(end)?;

    if start_seconds >= end_seconds {
        return Err(SplitError::OrderingViolation);
    }

    if start_seconds < 0.0 {
        return Err(SplitError::OutOfBounds(
            "start time cannot be negative".to_owned(),
        ));
    }

    if end_seconds > total_duration_seconds {
        return Err(SplitError::OutOfBounds(format!(
            "end time exceeds audio duration ({})",
            format_time(total_duration_seconds)
        )));
    }

    Ok(())
}

/// Convert seconds into whole milliseconds, rounding to the nearest one.
///
/// Returns `None` for negative, NaN or infinite input.
pub fn seconds_to_ms(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1_000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(59.9), "00:59");
        assert_eq!(format_time(125.0), "02:05");
        assert_eq!(format_time(5_400.0), "90:00");
    }

    #[test]
    fn formats_invalid_input_as_zero() {
        assert_eq!(format_time(-3.0), "00:00");
        assert_eq!(format_time(f64::NAN), "00:00");
    }

    #[test]
    fn parses_well_formed_times() {
        assert_eq!(parse_time("00:00").unwrap(), 0.0);
        assert_eq!(parse_time("1:05").unwrap(), 65.0);
        assert_eq!(parse_time("02:05").unwrap(), 125.0);
        assert_eq!(parse_time("120:59").unwrap(), 7_259.0);
    }

    #[test]
    fn rejects_malformed_times() {
        for input in ["", "1:2", "01:60", "01-30", ":30", "01:", "1:300", "a1:30", "01:3x", " 01:30"] {
            assert!(
                matches!(parse_time(input), Err(SplitError::InvalidFormat { .. })),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn format_inverts_parse() {
        for input in ["00:00", "00:59", "01:30", "59:59", "99:00"] {
            assert_eq!(format_time(parse_time(input).unwrap()), input);
        }
    }

    #[test]
    fn validates_time_ranges() {
        assert!(validate_time_range("00:10", "00:20", 125.0).is_ok());
        assert!(validate_time_range("00:10", "02:05", 125.0).is_ok());
        assert!(matches!(
            validate_time_range("0:1", "00:20", 125.0),
            Err(SplitError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_time_range("00:20", "00:20", 125.0),
            Err(SplitError::OrderingViolation)
        ));
        assert!(matches!(
            validate_time_range("00:30", "00:20", 125.0),
            Err(SplitError::OrderingViolation)
        ));
        let err = validate_time_range("01:00", "02:06", 125.0).unwrap_err();
        assert!(matches!(err, SplitError::OutOfBounds(_)));
        assert_eq!(err.to_string(), "end time exceeds audio duration (02:05)");
    }

    #[test]
    fn converts_seconds_to_millis() {
        assert_eq!(seconds_to_ms(1.5), Some(1_500));
        assert_eq!(seconds_to_ms(0.0004), Some(0));
        assert_eq!(seconds_to_ms(-1.0), None);
        assert_eq!(seconds_to_ms(f64::INFINITY), None);
    }
}
