//! Canonical text form of scalar values.
//!
//! Every scalar has exactly one accepted spelling: parsing re-formats the
//! decoded value and rejects input that does not reproduce it, so a document
//! that parses always re-serializes byte-for-byte.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Timestamps are written in UTC with nanosecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found:?}")]
pub struct ValueError {
    pub expected: &'static str,
    pub found: String,
}

impl ValueError {
    pub fn new(expected: &'static str, found: impl Into<String>) -> Self {
        Self {
            expected,
            found: found.into(),
        }
    }
}

/// A value that occupies a single bullet line.
pub trait ScalarValue: Sized {
    /// Human-readable description of the accepted text, used in errors.
    const EXPECTED: &'static str;

    fn to_text(&self) -> Result<String, ValueError>;

    fn from_text(text: &str) -> Result<Self, ValueError>;
}

impl ScalarValue for String {
    const EXPECTED: &'static str = "text without line breaks";

    fn to_text(&self) -> Result<String, ValueError> {
        if self.contains(['\n', '\r']) {
            return Err(ValueError::new(Self::EXPECTED, self.as_str()));
        }
        Ok(self.clone())
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        Ok(text.to_string())
    }
}

impl ScalarValue for bool {
    const EXPECTED: &'static str = "`True` or `False`";

    fn to_text(&self) -> Result<String, ValueError> {
        Ok(if *self { "True" } else { "False" }.to_string())
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        match text {
            "True" => Ok(true),
            "False" => Ok(false),
            other => Err(ValueError::new(Self::EXPECTED, other)),
        }
    }
}

macro_rules! integer_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ScalarValue for $ty {
                const EXPECTED: &'static str =
                    concat!("a base-10 ", stringify!($ty), " without padding");

                fn to_text(&self) -> Result<String, ValueError> {
                    Ok(self.to_string())
                }

                fn from_text(text: &str) -> Result<Self, ValueError> {
                    match text.parse::<$ty>() {
                        Ok(value) if value.to_string() == text => Ok(value),
                        _ => Err(ValueError::new(Self::EXPECTED, text)),
                    }
                }
            }
        )*
    };
}

integer_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ScalarValue for Uuid {
    const EXPECTED: &'static str = "a lower-case hyphenated UUID";

    fn to_text(&self) -> Result<String, ValueError> {
        Ok(self.hyphenated().to_string())
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        match Uuid::parse_str(text) {
            Ok(id) if id.hyphenated().to_string() == text => Ok(id),
            _ => Err(ValueError::new(Self::EXPECTED, text)),
        }
    }
}

impl ScalarValue for DateTime<Utc> {
    const EXPECTED: &'static str = "a UTC timestamp like 2024-01-31T09:30:00.000000000Z";

    fn to_text(&self) -> Result<String, ValueError> {
        // Four-digit years only; chrono adds a sign outside this range.
        if !(0..=9999).contains(&self.year()) {
            return Err(ValueError::new(Self::EXPECTED, self.to_rfc3339()));
        }
        Ok(self.format(TIMESTAMP_FORMAT).to_string())
    }

    fn from_text(text: &str) -> Result<Self, ValueError> {
        let parsed = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| ValueError::new(Self::EXPECTED, text))?;
        if parsed.format(TIMESTAMP_FORMAT).to_string() != text {
            return Err(ValueError::new(Self::EXPECTED, text));
        }
        Ok(parsed)
    }
}
