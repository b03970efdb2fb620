use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest magnitude of `seconds` a protobuf `Duration` may carry
/// (roughly 10,000 years).
pub const MAX_SECONDS: i64 = 315_576_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("duration must end with 's': {0:?}")]
    MissingSuffix(String),
    #[error("invalid seconds in duration: {0:?}")]
    InvalidSeconds(String),
    #[error("invalid fractional seconds in duration: {0:?}")]
    InvalidFraction(String),
    #[error("duration out of range: {0:?}")]
    OutOfRange(String),
}

/// A protobuf `google.protobuf.Duration`.
///
/// The recognition service reports word offsets with it. On the wire it
/// is the proto3 JSON string form, `"1.400s"`; `seconds` and `nanos`
/// always share a sign.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

impl Duration {
    #[must_use]
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    /// Builds a duration from whole milliseconds. Handy for tests and
    /// for callers that track offsets as integers.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis / 1000,
            nanos: ((millis % 1000) * 1_000_000) as i32,
        }
    }

    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.seconds < 0 || self.nanos < 0
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let body = value
            .strip_suffix('s')
            .ok_or_else(|| DurationParseError::MissingSuffix(value.into()))?;

        let (negative, body) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let (whole, fraction) = match body.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (body, None),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DurationParseError::InvalidSeconds(value.into()));
        }

        let seconds = whole
            .parse::<i64>()
            .map_err(|_| DurationParseError::OutOfRange(value.into()))?;

        if seconds > MAX_SECONDS {
            return Err(DurationParseError::OutOfRange(value.into()));
        }

        let nanos = match fraction {
            None => 0,
            Some(digits) => {
                if digits.is_empty()
                    || digits.len() > 9
                    || !digits.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(DurationParseError::InvalidFraction(
                        value.into(),
                    ));
                }

                // right-pad to nine digits, "4" is 400ms
                format!("{digits:0<9}").parse::<i32>().map_err(|_| {
                    DurationParseError::InvalidFraction(value.into())
                })?
            }
        };

        if negative {
            Ok(Self::new(-seconds, -nanos))
        } else {
            Ok(Self::new(seconds, nanos))
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let seconds = self.seconds.unsigned_abs();
        let nanos = self.nanos.unsigned_abs();

        if nanos == 0 {
            write!(f, "{sign}{seconds}s")
        } else if nanos % 1_000_000 == 0 {
            write!(f, "{sign}{seconds}.{:03}s", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            write!(f, "{sign}{seconds}.{:06}s", nanos / 1_000)
        } else {
            write!(f, "{sign}{seconds}.{nanos:09}s")
        }
    }
}

impl TryFrom<String> for Duration {
    type Error = DurationParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Duration> for String {
    fn from(duration: Duration) -> Self {
        duration.to_string()
    }
}

impl From<std::time::Duration> for Duration {
    #[allow(clippy::cast_possible_wrap)]
    fn from(duration: std::time::Duration) -> Self {
        Self {
            seconds: duration.as_secs() as i64,
            nanos: duration.subsec_nanos() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fractional_seconds() {
        assert_eq!("0s".parse::<Duration>(), Ok(Duration::new(0, 0)));
        assert_eq!("3s".parse::<Duration>(), Ok(Duration::new(3, 0)));
        assert_eq!(
            "1.400s".parse::<Duration>(),
            Ok(Duration::new(1, 400_000_000))
        );
        assert_eq!(
            "0.5s".parse::<Duration>(),
            Ok(Duration::new(0, 500_000_000))
        );
        assert_eq!(
            "12.000340012s".parse::<Duration>(),
            Ok(Duration::new(12, 340_012))
        );
    }

    #[test]
    fn test_parse_negative_applies_sign_to_both_parts() {
        assert_eq!(
            "-2.5s".parse::<Duration>(),
            Ok(Duration::new(-2, -500_000_000))
        );
        assert_eq!(
            "-0.25s".parse::<Duration>(),
            Ok(Duration::new(0, -250_000_000))
        );
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        assert!(matches!(
            "1.5".parse::<Duration>(),
            Err(DurationParseError::MissingSuffix(_))
        ));
        assert!(matches!(
            "s".parse::<Duration>(),
            Err(DurationParseError::InvalidSeconds(_))
        ));
        assert!(matches!(
            "+1s".parse::<Duration>(),
            Err(DurationParseError::InvalidSeconds(_))
        ));
        assert!(matches!(
            "1.s".parse::<Duration>(),
            Err(DurationParseError::InvalidFraction(_))
        ));
        assert!(matches!(
            "1.1234567891s".parse::<Duration>(),
            Err(DurationParseError::InvalidFraction(_))
        ));
        assert!(matches!(
            "315576000001s".parse::<Duration>(),
            Err(DurationParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_display_uses_shortest_canonical_fraction() {
        assert_eq!(Duration::new(0, 0).to_string(), "0s");
        assert_eq!(Duration::new(1, 400_000_000).to_string(), "1.400s");
        assert_eq!(Duration::new(1, 400_100_000).to_string(), "1.400100s");
        assert_eq!(Duration::new(1, 400_100_001).to_string(), "1.400100001s");
        assert_eq!(Duration::new(-2, -500_000_000).to_string(), "-2.500s");
    }

    #[test]
    fn test_json_string_form() {
        let duration: Duration = serde_json::from_str("\"7.250s\"").unwrap();
        assert_eq!(duration, Duration::new(7, 250_000_000));
        assert_eq!(serde_json::to_string(&duration).unwrap(), "\"7.250s\"");

        assert!(serde_json::from_str::<Duration>("\"7.250\"").is_err());
        assert!(serde_json::from_str::<Duration>("7.25").is_err());
    }

    #[test]
    fn test_from_millis() {
        assert_eq!(Duration::from_millis(1400), Duration::new(1, 400_000_000));
        assert_eq!(Duration::from_millis(500), Duration::new(0, 500_000_000));
    }
}
