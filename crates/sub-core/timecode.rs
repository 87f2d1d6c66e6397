//! Absolute time values for cue timing
//!
//! [`TimeCode`] is an immutable millisecond count. Construction from clock
//! components validates that the result is not negative; construction from a
//! raw count and subtraction do not, and [`TimeCode::is_negative`] exposes the
//! result to the caller instead of normalizing it.
//!
//! # Example
//!
//! ```rust
//! use sub_core::TimeCode;
//!
//! let start = TimeCode::new(0, 1, 30, 250, 0)?;
//! assert_eq!(start.millis(), 90_250);
//! assert_eq!(start.to_string(), "00:01:30.250");
//!
//! let shifted = TimeCode::new(0, 0, 1, 0, -2_000);
//! assert!(shifted.is_err());
//! # Ok::<(), sub_core::ParseError>(())
//! ```

use core::fmt;
use core::ops::Sub;

use crate::parser::errors::{ParseError, ParseResult};

/// Milliseconds per second
const MS_PER_SECOND: i64 = 1_000;
/// Milliseconds per minute
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
/// Milliseconds per hour
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

/// Absolute time in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeCode {
    /// Milliseconds since the start of the media
    millis: i64,
}

impl TimeCode {
    /// Time zero
    pub const ZERO: Self = Self { millis: 0 };

    /// Build a time from clock components plus an offset
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidTimeRange`] if the resulting value is
    /// negative.
    pub fn new(
        hour: u32,
        minute: u32,
        second: u32,
        millisecond: u32,
        offset: i64,
    ) -> ParseResult<Self> {
        let millis = i64::from(hour) * MS_PER_HOUR
            + i64::from(minute) * MS_PER_MINUTE
            + i64::from(second) * MS_PER_SECOND
            + i64::from(millisecond);
        let millis = millis.saturating_add(offset);

        if millis < 0 {
            return Err(ParseError::InvalidTimeRange { millis });
        }

        Ok(Self { millis })
    }

    /// Build a time from a raw millisecond count without validation
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// Raw millisecond count
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.millis
    }

    /// Whole hours
    #[must_use]
    pub const fn hour(self) -> i64 {
        self.millis / MS_PER_HOUR
    }

    /// Minutes within the hour
    #[must_use]
    pub const fn minute(self) -> i64 {
        (self.millis / MS_PER_MINUTE) % 60
    }

    /// Seconds within the minute
    #[must_use]
    pub const fn second(self) -> i64 {
        (self.millis / MS_PER_SECOND) % 60
    }

    /// Milliseconds within the second
    #[must_use]
    pub const fn millisecond(self) -> i64 {
        self.millis % MS_PER_SECOND
    }

    /// Check whether raw arithmetic produced a value before time zero
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.millis < 0
    }

    /// Shift by `delta` milliseconds, `None` on overflow
    #[must_use]
    pub const fn checked_add_millis(self, delta: i64) -> Option<Self> {
        match self.millis.checked_add(delta) {
            Some(millis) => Some(Self { millis }),
            None => None,
        }
    }
}

impl Sub for TimeCode {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_millis(self.millis.saturating_sub(rhs.millis))
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = Self::from_millis(self.millis.saturating_abs());
        write!(
            f,
            "{sign}{:02}:{:02}:{:02}.{:03}",
            abs.hour(),
            abs.minute(),
            abs.second(),
            abs.millisecond()
        )
    }
}
