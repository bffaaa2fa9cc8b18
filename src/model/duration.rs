//! Durations and time-unit conversion.
//!
//! Every duration and elapsed value in the crate is an integer count of
//! hundredths of a second. This module converts between that single number
//! and the (hours, minutes, seconds, hundredths) fields users edit, and
//! renders it as `HH:MM:SS:hh`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Hundredths of a second in one hour.
pub const HUNDREDTHS_PER_HOUR: u64 = 360_000;

/// Hundredths of a second in one minute.
pub const HUNDREDTHS_PER_MINUTE: u64 = 6_000;

/// Hundredths of a second in one second.
pub const HUNDREDTHS_PER_SECOND: u64 = 100;

const MAX_MINUTES: u32 = 59;
const MAX_SECONDS: u32 = 59;
const MAX_HUNDREDTHS: u32 = 99;

// ============================================================================
// StepDuration
// ============================================================================

/// Configured length of an event.
///
/// Fields are always within range: minutes and seconds in `0..=59`,
/// hundredths in `0..=99`. Hours have no upper bound. A zero duration means
/// the event has no timer and never completes on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDuration")]
pub struct StepDuration {
    hours: u32,
    minutes: u32,
    seconds: u32,
    hundredths: u32,
}

impl StepDuration {
    /// A duration of zero ("no timer").
    pub const ZERO: StepDuration = StepDuration {
        hours: 0,
        minutes: 0,
        seconds: 0,
        hundredths: 0,
    };

    /// Creates a duration, clamping every field into its range.
    #[must_use]
    pub fn new(hours: u32, minutes: u32, seconds: u32, hundredths: u32) -> Self {
        Self {
            hours,
            minutes: minutes.min(MAX_MINUTES),
            seconds: seconds.min(MAX_SECONDS),
            hundredths: hundredths.min(MAX_HUNDREDTHS),
        }
    }

    /// Creates a duration from signed field values.
    ///
    /// Negative values become 0; the rest is clamped as in [`StepDuration::new`].
    #[must_use]
    pub fn from_fields(hours: i64, minutes: i64, seconds: i64, hundredths: i64) -> Self {
        Self::new(
            clamp_to_u32(hours),
            clamp_to_u32(minutes),
            clamp_to_u32(seconds),
            clamp_to_u32(hundredths),
        )
    }

    /// Shorthand for a duration of whole minutes.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Self {
        Self::from_hundredths(u64::from(minutes) * HUNDREDTHS_PER_MINUTE)
    }

    /// Shorthand for a duration of whole seconds.
    #[must_use]
    pub fn from_seconds(seconds: u32) -> Self {
        Self::from_hundredths(u64::from(seconds) * HUNDREDTHS_PER_SECOND)
    }

    /// Splits a total number of hundredths back into fields.
    #[must_use]
    pub fn from_hundredths(total: u64) -> Self {
        let hours = total / HUNDREDTHS_PER_HOUR;
        let minutes = total % HUNDREDTHS_PER_HOUR / HUNDREDTHS_PER_MINUTE;
        let seconds = total % HUNDREDTHS_PER_MINUTE / HUNDREDTHS_PER_SECOND;
        let hundredths = total % HUNDREDTHS_PER_SECOND;

        Self {
            hours: u32::try_from(hours).unwrap_or(u32::MAX),
            // The remainders are below 60 / 100 and always fit.
            minutes: minutes as u32,
            seconds: seconds as u32,
            hundredths: hundredths as u32,
        }
    }

    /// Total length in hundredths of a second.
    #[must_use]
    pub fn total_hundredths(&self) -> u64 {
        u64::from(self.hours) * HUNDREDTHS_PER_HOUR
            + u64::from(self.minutes) * HUNDREDTHS_PER_MINUTE
            + u64::from(self.seconds) * HUNDREDTHS_PER_SECOND
            + u64::from(self.hundredths)
    }

    /// Returns true if this duration means "no timer".
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total_hundredths() == 0
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn hundredths(&self) -> u32 {
        self.hundredths
    }
}

impl std::fmt::Display for StepDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_hundredths(self.total_hundredths()))
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Persisted shape of a duration. Out-of-range values found on disk are
/// clamped instead of rejected.
#[derive(Deserialize)]
struct RawDuration {
    #[serde(default)]
    hours: i64,
    #[serde(default)]
    minutes: i64,
    #[serde(default)]
    seconds: i64,
    #[serde(default)]
    hundredths: i64,
}

impl From<RawDuration> for StepDuration {
    fn from(raw: RawDuration) -> Self {
        Self::from_fields(raw.hours, raw.minutes, raw.seconds, raw.hundredths)
    }
}

// ============================================================================
// DurationInput
// ============================================================================

/// Raw duration fields as typed by a user.
///
/// Absent fields keep the current value when applied with
/// [`DurationInput::apply_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hundredths: Option<String>,
}

impl DurationInput {
    /// Merges the typed fields over `current` and clamps the result.
    #[must_use]
    pub fn apply_to(&self, current: StepDuration) -> StepDuration {
        let pick = |field: &Option<String>, fallback: u32| -> i64 {
            field
                .as_deref()
                .map_or(i64::from(fallback), parse_field)
        };

        StepDuration::from_fields(
            pick(&self.hours, current.hours),
            pick(&self.minutes, current.minutes),
            pick(&self.seconds, current.seconds),
            pick(&self.hundredths, current.hundredths),
        )
    }
}

/// Parses one user-typed field.
///
/// The leading integer is kept (`"3.7"` reads as 3, `"12abc"` as 12); input
/// without leading digits reads as 0. Oversized numbers saturate.
#[must_use]
pub fn parse_field(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return 0;
    }

    let magnitude = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats hundredths as `HH:MM:SS:hh`, every field padded to two digits.
#[must_use]
pub fn format_hundredths(total: u64) -> String {
    let d = StepDuration::from_hundredths(total);
    format!(
        "{:02}:{:02}:{:02}:{:02}",
        d.hours, d.minutes, d.seconds, d.hundredths
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_hundredths() {
        let d = StepDuration::new(1, 2, 3, 4);
        assert_eq!(d.total_hundredths(), 360_000 + 12_000 + 300 + 4);
    }

    #[test]
    fn test_new_clamps_fields() {
        let d = StepDuration::new(200, 75, 60, 150);
        assert_eq!(d.hours(), 200);
        assert_eq!(d.minutes(), 59);
        assert_eq!(d.seconds(), 59);
        assert_eq!(d.hundredths(), 99);
    }

    #[test]
    fn test_from_fields_negative_becomes_zero() {
        let d = StepDuration::from_fields(-1, -30, 12, -5);
        assert_eq!(d, StepDuration::new(0, 0, 12, 0));
    }

    #[test]
    fn test_from_hundredths_splits_fields() {
        let d = StepDuration::from_hundredths(373_456);
        assert_eq!(d.hours(), 1);
        assert_eq!(d.minutes(), 2);
        assert_eq!(d.seconds(), 14);
        assert_eq!(d.hundredths(), 56);
        assert_eq!(d.total_hundredths(), 373_456);
    }

    #[test]
    fn test_shorthands() {
        assert_eq!(StepDuration::from_minutes(10).total_hundredths(), 60_000);
        assert_eq!(StepDuration::from_seconds(2).total_hundredths(), 200);
        assert!(StepDuration::ZERO.is_zero());
        assert!(!StepDuration::from_seconds(1).is_zero());
    }

    #[test]
    fn test_format_hundredths() {
        assert_eq!(format_hundredths(0), "00:00:00:00");
        assert_eq!(format_hundredths(6_001), "00:01:00:01");
        assert_eq!(format_hundredths(373_456), "01:02:14:56");
        assert_eq!(format_hundredths(100 * HUNDREDTHS_PER_HOUR), "100:00:00:00");
    }

    #[test]
    fn test_display_uses_clock_format() {
        assert_eq!(StepDuration::from_minutes(10).to_string(), "00:10:00:00");
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field("42"), 42);
        assert_eq!(parse_field(" 7 "), 7);
        assert_eq!(parse_field("-3"), -3);
        assert_eq!(parse_field("abc"), 0);
        assert_eq!(parse_field("3.7"), 3);
        assert_eq!(parse_field("12abc"), 12);
        assert_eq!(parse_field("-4min"), -4);
        assert_eq!(parse_field("+8"), 8);
        assert_eq!(parse_field("-"), 0);
        assert_eq!(parse_field("99999999999999999999999"), i64::MAX);
        assert_eq!(parse_field(""), 0);
    }

    #[test]
    fn test_duration_input_merges_and_clamps() {
        let current = StepDuration::new(1, 10, 0, 0);
        let input = DurationInput {
            minutes: Some("75".to_string()),
            seconds: Some("oops".to_string()),
            hundredths: Some("-4".to_string()),
            ..Default::default()
        };

        let updated = input.apply_to(current);
        assert_eq!(updated, StepDuration::new(1, 59, 0, 0));
    }

    #[test]
    fn test_duration_input_keeps_leading_integer() {
        let input = DurationInput {
            minutes: Some("3.7".to_string()),
            seconds: Some("12abc".to_string()),
            ..Default::default()
        };

        assert_eq!(input.apply_to(StepDuration::ZERO), StepDuration::new(0, 3, 12, 0));
    }

    #[test]
    fn test_deserialize_clamps_out_of_range_values() {
        let json = r#"{"hours":-2,"minutes":99,"seconds":5,"hundredths":250}"#;
        let d: StepDuration = serde_json::from_str(json).unwrap();
        assert_eq!(d, StepDuration::new(0, 59, 5, 99));
    }

    #[test]
    fn test_deserialize_missing_fields_default_to_zero() {
        let d: StepDuration = serde_json::from_str(r#"{"minutes":3}"#).unwrap();
        assert_eq!(d, StepDuration::from_minutes(3));
    }
}
