//! Record-set query construction.
//!
//! The archive addresses records with a bracketed syntax:
//!
//! ```text
//! hmi.sharp_cea_720s[7117][2017.09.03_00:00_TAI-2017.09.06_00:00_TAI@4h]
//! ```
//!
//! The first clause selects the tracked region, the second the inclusive
//! time range, and an optional `@cadence` inside the range clause asks the
//! archive to subsample. The query is held structurally and only rendered
//! at the edge, so no clause can be corrupted by string splicing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sharp_common::{HarpId, SharpError, TimeRange};

/// Data series the original pipeline targets: definitive SHARP patches in
/// cylindrical equal-area projection at 720 s cadence.
pub const DEFAULT_SERIES: &str = "hmi.sharp_cea_720s";

/// Subsampling step for the time-range clause, e.g. `4h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    pub count: u32,
    pub unit: CadenceUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CadenceUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl CadenceUnit {
    fn suffix(&self) -> char {
        match self {
            CadenceUnit::Seconds => 's',
            CadenceUnit::Minutes => 'm',
            CadenceUnit::Hours => 'h',
            CadenceUnit::Days => 'd',
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c {
            's' => Some(CadenceUnit::Seconds),
            'm' => Some(CadenceUnit::Minutes),
            'h' => Some(CadenceUnit::Hours),
            'd' => Some(CadenceUnit::Days),
            _ => None,
        }
    }
}

impl Cadence {
    pub fn new(count: u32, unit: CadenceUnit) -> Self {
        Self { count, unit }
    }
}

impl FromStr for Cadence {
    type Err = SharpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SharpError::MalformedCadence(s.to_string());

        let s = s.trim();
        let unit_char = s.chars().last().ok_or_else(malformed)?;
        let unit = CadenceUnit::from_suffix(unit_char).ok_or_else(malformed)?;

        let count: u32 = s[..s.len() - 1].parse().map_err(|_| malformed())?;
        if count == 0 {
            return Err(malformed());
        }
        Ok(Cadence { count, unit })
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

/// A fully-specified archive query: series, region, time range, and an
/// optional cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSetQuery {
    series: String,
    harp: HarpId,
    range: TimeRange,
    cadence: Option<Cadence>,
}

impl RecordSetQuery {
    pub fn new(series: impl Into<String>, harp: HarpId, range: TimeRange) -> Self {
        Self {
            series: series.into(),
            harp,
            range,
            cadence: None,
        }
    }

    /// Query against the default SHARP series.
    pub fn sharp(harp: HarpId, range: TimeRange) -> Self {
        Self::new(DEFAULT_SERIES, harp, range)
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = Some(cadence);
        self
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    pub fn harp(&self) -> HarpId {
        self.harp
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    pub fn cadence(&self) -> Option<Cadence> {
        self.cadence
    }

    /// Render the archive's bracketed record-set syntax.
    pub fn to_query_string(&self) -> String {
        match self.cadence {
            Some(cadence) => format!("{}[{}][{}@{}]", self.series, self.harp, self.range, cadence),
            None => format!("{}[{}][{}]", self.series, self.harp, self.range),
        }
    }
}

impl fmt::Display for RecordSetQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharp_common::TaiTimestamp;

    fn example_range() -> TimeRange {
        TimeRange::new(
            TaiTimestamp::parse("2017.09.03_00:00_TAI").unwrap(),
            TaiTimestamp::parse("2017.09.06_00:00_TAI").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_query_without_cadence() {
        let query = RecordSetQuery::sharp(HarpId::new(7117), example_range());
        assert_eq!(
            query.to_query_string(),
            "hmi.sharp_cea_720s[7117][2017.09.03_00:00_TAI-2017.09.06_00:00_TAI]"
        );
    }

    #[test]
    fn test_query_with_cadence() {
        let query = RecordSetQuery::sharp(HarpId::new(7117), example_range())
            .with_cadence("4h".parse().unwrap());
        assert_eq!(
            query.to_query_string(),
            "hmi.sharp_cea_720s[7117][2017.09.03_00:00_TAI-2017.09.06_00:00_TAI@4h]"
        );
    }

    #[test]
    fn test_query_custom_series() {
        let query = RecordSetQuery::new("hmi.sharp_720s", HarpId::new(401), example_range());
        assert!(query.to_query_string().starts_with("hmi.sharp_720s[401]["));
    }

    #[test]
    fn test_cadence_parse() {
        assert_eq!(
            "4h".parse::<Cadence>().unwrap(),
            Cadence::new(4, CadenceUnit::Hours)
        );
        assert_eq!(
            "720s".parse::<Cadence>().unwrap(),
            Cadence::new(720, CadenceUnit::Seconds)
        );
        assert_eq!(
            "1d".parse::<Cadence>().unwrap(),
            Cadence::new(1, CadenceUnit::Days)
        );
    }

    #[test]
    fn test_cadence_parse_rejects_garbage() {
        assert!("".parse::<Cadence>().is_err());
        assert!("h".parse::<Cadence>().is_err());
        assert!("4".parse::<Cadence>().is_err());
        assert!("4w".parse::<Cadence>().is_err());
        assert!("0h".parse::<Cadence>().is_err());
        assert!("-4h".parse::<Cadence>().is_err());
    }

    #[test]
    fn test_cadence_display_roundtrip() {
        for s in ["4h", "30m", "720s", "2d"] {
            assert_eq!(s.parse::<Cadence>().unwrap().to_string(), s);
        }
    }
}
