/// Clock-string rendering of recognition offsets.
///
/// The recognition service reports word offsets as protobuf durations.
/// Two readings are supported:
/// - `Clock::TimeOfDay` treats the offset as seconds since the Unix epoch
///   and renders the UTC time of day. Offsets of 24h or more wrap back to
///   `00:00:00`; the date is dropped.
/// - `Clock::Elapsed` renders the offset as elapsed hours, minutes and
///   seconds, so hours keep counting past 23.
use std::fmt;

use chrono::{DateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::Duration;

/// First second that no longer fits a four-digit year
/// (10000-01-01T00:00:00Z).
pub const MAX_EPOCH_SECONDS: i64 = 253_402_300_800;

/// Last second before 0001-01-01T00:00:00Z.
pub const MIN_EPOCH_SECONDS: i64 = -62_135_596_801;

const NANOS_PER_SECOND: i32 = 1_000_000_000;
const NANOS_PER_MILLI: i32 = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Duration number too large.")]
    TooLarge(i64),
    #[error("Duration number too small.")]
    TooSmall(i64),
    #[error("Duration nanos out of range: {0}")]
    InvalidNanos(i32),
    #[error("Negative offset {0} has no elapsed-time representation")]
    Negative(Duration),
}

/// How a recognition offset maps onto a clock string.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Clock {
    TimeOfDay,

    #[default]
    Elapsed,
}

/// A rendered clock value, millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub hours: u64,
    pub minutes: u32,
    pub seconds: u32,
    pub millis: u32,
}

impl Timestamp {
    /// Converts a recognition offset into a clock value.
    ///
    /// # Errors
    /// - `TooLarge` when `seconds >= MAX_EPOCH_SECONDS`
    /// - `TooSmall` when `seconds <= MIN_EPOCH_SECONDS`
    /// - `InvalidNanos` when `nanos` is a whole second or more
    /// - `Negative` for a negative offset under `Clock::Elapsed`
    pub fn from_duration(
        duration: &Duration,
        clock: Clock,
    ) -> Result<Self, TimestampError> {
        if duration.seconds >= MAX_EPOCH_SECONDS {
            return Err(TimestampError::TooLarge(duration.seconds));
        }

        if duration.seconds <= MIN_EPOCH_SECONDS {
            return Err(TimestampError::TooSmall(duration.seconds));
        }

        if duration.nanos.unsigned_abs() >= NANOS_PER_SECOND.unsigned_abs() {
            return Err(TimestampError::InvalidNanos(duration.nanos));
        }

        match clock {
            Clock::TimeOfDay => Self::time_of_day(duration),
            Clock::Elapsed => Self::elapsed(duration),
        }
    }

    fn time_of_day(duration: &Duration) -> Result<Self, TimestampError> {
        // an instant just before a whole second borrows from it
        let (seconds, nanos) = if duration.nanos < 0 {
            (duration.seconds - 1, duration.nanos + NANOS_PER_SECOND)
        } else {
            (duration.seconds, duration.nanos)
        };

        let instant = DateTime::from_timestamp(seconds, nanos.unsigned_abs())
            .ok_or(TimestampError::TooSmall(seconds))?;
        let time = instant.time();

        Ok(Self {
            hours: u64::from(time.hour()),
            minutes: time.minute(),
            seconds: time.second(),
            millis: (nanos / NANOS_PER_MILLI).unsigned_abs(),
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn elapsed(duration: &Duration) -> Result<Self, TimestampError> {
        if duration.is_negative() {
            return Err(TimestampError::Negative(*duration));
        }

        let total = duration.seconds.unsigned_abs();

        Ok(Self {
            hours: total / 3600,
            minutes: ((total % 3600) / 60) as u32,
            seconds: (total % 60) as u32,
            millis: (duration.nanos / NANOS_PER_MILLI).unsigned_abs(),
        })
    }

    /// SubRip form, `HH:MM:SS,mmm`.
    #[must_use]
    pub fn to_srt(&self) -> String {
        format!(
            "{:02}:{:02}:{:02},{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

/// Formats an offset as the UTC time of day of the matching epoch
/// instant, `HH:MM:SS.mmm`.
///
/// # Errors
/// See [`Timestamp::from_duration`].
pub fn format_timestamp(duration: &Duration) -> Result<String, TimestampError> {
    Ok(Timestamp::from_duration(duration, Clock::TimeOfDay)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_clock_string(value: &str) -> bool {
        let bytes = value.as_bytes();

        bytes.len() == 12
            && bytes.iter().enumerate().all(|(i, b)| match i {
                2 | 5 => *b == b':',
                8 => *b == b'.' || *b == b',',
                _ => b.is_ascii_digit(),
            })
    }

    #[test]
    fn test_epoch_is_midnight() {
        assert_eq!(
            format_timestamp(&Duration::new(0, 0)).unwrap(),
            "00:00:00.000"
        );
    }

    #[test]
    fn test_bounds() {
        assert_eq!(
            format_timestamp(&Duration::new(253_402_300_800, 0)),
            Err(TimestampError::TooLarge(253_402_300_800))
        );
        assert_eq!(
            format_timestamp(&Duration::new(-62_135_596_801, 0)),
            Err(TimestampError::TooSmall(-62_135_596_801))
        );
        assert_eq!(
            TimestampError::TooLarge(0).to_string(),
            "Duration number too large."
        );
        assert_eq!(
            TimestampError::TooSmall(0).to_string(),
            "Duration number too small."
        );

        assert_eq!(
            format_timestamp(&Duration::new(253_402_300_799, 0)).unwrap(),
            "23:59:59.000"
        );
        assert_eq!(
            format_timestamp(&Duration::new(-62_135_596_800, 0)).unwrap(),
            "00:00:00.000"
        );

        // the elapsed clock shares the bounds
        assert!(matches!(
            Timestamp::from_duration(
                &Duration::new(253_402_300_800, 0),
                Clock::Elapsed
            ),
            Err(TimestampError::TooLarge(_))
        ));
    }

    #[test]
    fn test_pattern_holds_across_range() {
        let samples = [
            -62_135_596_800,
            -86_401,
            -1,
            0,
            1,
            59,
            3599,
            3600,
            86_399,
            86_400,
            1_700_000_000,
            253_402_300_799,
        ];

        for seconds in samples {
            for nanos in [0, 1, 999_999, 1_000_000, 500_000_000, 999_999_999] {
                let value =
                    format_timestamp(&Duration::new(seconds, nanos)).unwrap();
                assert!(is_clock_string(&value), "{seconds}/{nanos}: {value}");
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let duration = Duration::new(1_234_567, 890_000_000);

        assert_eq!(
            format_timestamp(&duration).unwrap(),
            format_timestamp(&duration).unwrap()
        );
    }

    #[test]
    fn test_millis_are_truncated() {
        assert_eq!(
            format_timestamp(&Duration::new(1, 400_999_999)).unwrap(),
            "00:00:01.400"
        );
        assert_eq!(
            format_timestamp(&Duration::new(0, 999_999)).unwrap(),
            "00:00:00.000"
        );
    }

    #[test]
    fn test_time_of_day_wraps_after_a_day() {
        let day_and_a_bit = Duration::new(86_400 + 61, 5_000_000);

        assert_eq!(format_timestamp(&day_and_a_bit).unwrap(), "00:01:01.005");
        assert_eq!(
            Timestamp::from_duration(&day_and_a_bit, Clock::Elapsed)
                .unwrap()
                .to_string(),
            "24:01:01.005"
        );
    }

    #[test]
    fn test_elapsed_hours_keep_counting() {
        let timestamp = Timestamp::from_duration(
            &Duration::new(100 * 3600 + 5 * 60 + 7, 250_000_000),
            Clock::Elapsed,
        )
        .unwrap();

        assert_eq!(timestamp.hours, 100);
        assert_eq!(timestamp.to_srt(), "100:05:07,250");
    }

    #[test]
    fn test_negative_offsets() {
        assert_eq!(
            format_timestamp(&Duration::new(-2, -500_000_000)).unwrap(),
            "23:59:57.500"
        );
        assert_eq!(
            Timestamp::from_duration(
                &Duration::new(-2, -500_000_000),
                Clock::Elapsed
            ),
            Err(TimestampError::Negative(Duration::new(-2, -500_000_000)))
        );
    }

    #[test]
    fn test_invalid_nanos() {
        assert_eq!(
            format_timestamp(&Duration::new(1, 1_000_000_000)),
            Err(TimestampError::InvalidNanos(1_000_000_000))
        );
    }

    #[test]
    fn test_srt_form_uses_comma() {
        let timestamp = Timestamp::from_duration(
            &Duration::new(1, 400_000_000),
            Clock::Elapsed,
        )
        .unwrap();

        assert_eq!(timestamp.to_string(), "00:00:01.400");
        assert_eq!(timestamp.to_srt(), "00:00:01,400");
    }
}
