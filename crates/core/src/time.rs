use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

//
// ─── HH:MM:SS INTERVALS ────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntervalError {
    #[error("expected HH:MM:SS, got {fields} field(s) in {raw:?}")]
    FieldCount { raw: String, fields: usize },

    #[error("interval field {field:?} is not an integer")]
    NotANumber { field: String },

    #[error("interval {raw:?} is too large")]
    Overflow { raw: String },
}

/// Formats a duration in seconds as `HH:MM:SS`.
///
/// NaN, negative and negative-zero inputs format as `"00:00:00"`. Fractional seconds are
/// floored. Hours are not wrapped at 24, so long durations keep growing the
/// first field.
#[must_use]
pub fn seconds_to_interval(seconds: f64) -> String {
    // `<=` also catches -0.0, which would otherwise print as "-0".
    if seconds.is_nan() || seconds <= 0.0 {
        return "00:00:00".to_string();
    }
    let hours = (seconds / 3600.0).floor();
    let minutes = ((seconds % 3600.0) / 60.0).floor();
    let secs = (seconds % 60.0).floor();
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Integer convenience over [`seconds_to_interval`].
#[must_use]
pub fn secs_to_interval(seconds: u32) -> String {
    seconds_to_interval(f64::from(seconds))
}

/// Parses `HH:MM:SS` into seconds as `h * 3600 + m * 60 + s`.
///
/// Field ranges are not checked: `"99:99:99"` expands to `362_439`.
///
/// # Errors
///
/// Returns `IntervalError` if the text does not have exactly three
/// colon-separated integer fields, or if the total does not fit in `i64`.
pub fn interval_to_seconds(interval: &str) -> Result<i64, IntervalError> {
    let fields: Vec<&str> = interval.trim().split(':').collect();
    if fields.len() != 3 {
        return Err(IntervalError::FieldCount {
            raw: interval.to_string(),
            fields: fields.len(),
        });
    }

    let mut parsed = [0_i64; 3];
    for (slot, field) in parsed.iter_mut().zip(&fields) {
        *slot = field
            .trim()
            .parse::<i64>()
            .map_err(|_| IntervalError::NotANumber {
                field: (*field).to_string(),
            })?;
    }

    let [hours, minutes, seconds] = parsed;
    hours
        .checked_mul(3600)
        .zip(minutes.checked_mul(60))
        .and_then(|(h, m)| h.checked_add(m))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(|| IntervalError::Overflow {
            raw: interval.to_string(),
        })
}

/// Parses an interval and narrows it to non-negative whole seconds.
///
/// # Errors
///
/// Returns `IntervalError` when parsing fails. Negative totals clamp to 0.
pub fn interval_to_secs(interval: &str) -> Result<u32, IntervalError> {
    let total = interval_to_seconds(interval)?;
    Ok(u32::try_from(total.max(0)).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(seconds_to_interval(3723.0), "01:02:03");
        assert_eq!(seconds_to_interval(0.0), "00:00:00");
        assert_eq!(seconds_to_interval(59.9), "00:00:59");
        assert_eq!(secs_to_interval(10), "00:00:10");
    }

    #[test]
    fn negative_and_nan_format_as_zero() {
        assert_eq!(seconds_to_interval(-5.0), "00:00:00");
        assert_eq!(seconds_to_interval(f64::NAN), "00:00:00");
        assert_eq!(seconds_to_interval(-0.0), "00:00:00");
    }

    #[test]
    fn hours_are_not_wrapped() {
        assert_eq!(seconds_to_interval(100.0 * 3600.0), "100:00:00");
    }

    #[test]
    fn parses_interval() {
        assert_eq!(interval_to_seconds("01:02:03"), Ok(3723));
        assert_eq!(interval_to_seconds("00:00:00"), Ok(0));
    }

    #[test]
    fn parse_does_not_validate_ranges() {
        assert_eq!(interval_to_seconds("99:99:99"), Ok(99 * 3600 + 99 * 60 + 99));
    }

    #[test]
    fn oversized_fields_are_an_error() {
        for raw in [
            "9223372036854775807:00:00",
            "00:9223372036854775807:00",
            "00:00:9223372036854775807",
            "-9223372036854775807:00:00",
        ] {
            assert!(
                matches!(interval_to_seconds(raw), Err(IntervalError::Overflow { .. })),
                "{raw}"
            );
        }
        assert!(matches!(
            interval_to_secs("9223372036854775807:00:00"),
            Err(IntervalError::Overflow { .. })
        ));
    }

    #[test]
    fn parse_rejects_malformed_text() {
        assert!(matches!(
            interval_to_seconds("01:02"),
            Err(IntervalError::FieldCount { fields: 2, .. })
        ));
        assert!(matches!(
            interval_to_seconds("aa:00:00"),
            Err(IntervalError::NotANumber { .. })
        ));
    }

    #[test]
    fn display_format_is_stable_through_a_round_trip() {
        for s in [0_u32, 1, 59, 60, 61, 3599, 3600, 3723, 86_399, 86_400, 359_999] {
            let formatted = secs_to_interval(s);
            let reparsed = interval_to_seconds(&formatted).unwrap();
            #[allow(clippy::cast_precision_loss)]
            let again = seconds_to_interval(reparsed as f64);
            assert_eq!(again, formatted, "seconds = {s}");
        }
    }

    #[test]
    fn narrowing_clamps_negative_totals() {
        assert_eq!(interval_to_secs("-01:00:00"), Ok(0));
        assert_eq!(interval_to_secs("00:01:40"), Ok(100));
    }
}
