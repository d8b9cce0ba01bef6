//! Time handling for JSOC archive timestamps.
//!
//! The archive formats record times as `YYYY.MM.DD_HH:MM_TAI`, a fixed-width
//! layout parsed positionally. The `_TAI` suffix names the archive's time
//! scale but is never applied as a conversion; values are treated as naive
//! calendar timestamps throughout.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SharpError, SharpResult};

/// A calendar timestamp in the archive's TAI record format.
///
/// Seconds are not part of the format; record times are minute-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaiTimestamp {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
}

impl TaiTimestamp {
    /// Create from calendar fields, rejecting impossible dates and times.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> SharpResult<Self> {
        let ts = Self { year, month, day, hour, minute };
        ts.validate()?;
        Ok(ts)
    }

    /// Parse the fixed-width archive layout.
    ///
    /// Positions are fixed: `[0:4]` year, `[5:7]` month, `[8:10]` day,
    /// `[11:13]` hour, `[14:16]` minute, with literal separators `.`, `.`,
    /// `_`, `:` between them. Anything past index 16 (normally the `_TAI`
    /// suffix) is ignored. Short input, a wrong separator, a non-digit in a
    /// digit position, or an impossible calendar value is rejected.
    pub fn parse(input: &str) -> SharpResult<Self> {
        let malformed = |message: &str| SharpError::MalformedTimestamp {
            input: input.to_string(),
            message: message.to_string(),
        };

        let bytes = input.as_bytes();
        if bytes.len() < 16 {
            return Err(malformed("shorter than 16 characters"));
        }

        for (pos, expected) in [(4, b'.'), (7, b'.'), (10, b'_'), (13, b':')] {
            if bytes[pos] != expected {
                return Err(malformed(&format!(
                    "expected '{}' at position {}",
                    expected as char, pos
                )));
            }
        }

        // Work on bytes: a multibyte character anywhere in the prefix must
        // not panic a slice, it must report a malformed field.
        let field = |range: std::ops::Range<usize>| -> SharpResult<u32> {
            let digits = &bytes[range.clone()];
            if !digits.iter().all(|b| b.is_ascii_digit()) {
                return Err(malformed(&format!("non-digit in positions {:?}", range)));
            }
            Ok(digits.iter().fold(0u32, |acc, b| acc * 10 + (b - b'0') as u32))
        };

        let year = field(0..4)? as i32;
        let month = field(5..7)?;
        let day = field(8..10)?;
        let hour = field(11..13)?;
        let minute = field(14..16)?;

        let ts = Self { year, month, day, hour, minute };
        ts.validate().map_err(|_| malformed("impossible calendar date or time"))?;
        Ok(ts)
    }

    fn validate(&self) -> SharpResult<()> {
        let invalid = || SharpError::MalformedTimestamp {
            input: self.to_string(),
            message: "impossible calendar date or time".to_string(),
        };
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(invalid)?;
        if self.hour > 23 || self.minute > 59 {
            return Err(invalid());
        }
        Ok(())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Convert to a naive datetime. No timezone or TAI-to-UTC offset is
    /// applied.
    pub fn to_naive_datetime(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, 0))
            .expect("validated at construction")
    }
}

impl fmt::Display for TaiTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}.{:02}.{:02}_{:02}:{:02}_TAI",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// An inclusive start/end pair of archive timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TaiTimestamp,
    pub end: TaiTimestamp,
}

impl TimeRange {
    /// Create a range, rejecting end-before-start.
    pub fn new(start: TaiTimestamp, end: TaiTimestamp) -> SharpResult<Self> {
        if end.to_naive_datetime() < start.to_naive_datetime() {
            return Err(SharpError::InvalidTimeRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: &TaiTimestamp) -> bool {
        let dt = ts.to_naive_datetime();
        dt >= self.start.to_naive_datetime() && dt <= self.end.to_naive_datetime()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
