//! `jsoc_info op=rs_list` response model.
//!
//! The archive returns column-oriented JSON: one entry per requested
//! keyword and per requested segment, each carrying a `values` array with
//! one element per matched record:
//!
//! ```json
//! {
//!   "status": 0,
//!   "count": 2,
//!   "keywords": [
//!     {"name": "T_REC", "values": ["2017.09.03_00:00:00_TAI", "2017.09.03_04:00:00_TAI"]}
//!   ],
//!   "segments": [
//!     {"name": "Br", "values": ["/SUM12/D34567/S00000/Br.fits", "/SUM12/D34568/S00000/Br.fits"]}
//!   ]
//! }
//! ```
//!
//! A nonzero `status` means the archive rejected the query; the `error`
//! field then carries the reason.

use serde::{Deserialize, Serialize};
use std::fmt;

use sharp_common::{SharpError, SharpResult, TaiTimestamp};

/// Keyword name the record timestamps live under.
pub const T_REC: &str = "T_REC";

/// One keyword column: a name and one value per record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordColumn {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// One segment column: a name and one storage path per record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentColumn {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Archive-relative path to one downloadable segment file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentPath(pub String);

impl SegmentPath {
    /// Join onto the archive base URL. Paths in the response are absolute
    /// (`/SUM.../Br.fits`), so this is plain concatenation.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for SegmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed `rs_list` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSet {
    pub status: i64,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub keywords: Vec<KeywordColumn>,
    #[serde(default)]
    pub segments: Vec<SegmentColumn>,
    /// Reason text accompanying a nonzero status.
    #[serde(default)]
    pub error: Option<String>,
}

impl RecordSet {
    /// Deserialize and reject archive-reported failure.
    pub fn from_json(body: &str) -> SharpResult<Self> {
        let set: RecordSet = serde_json::from_str(body)?;
        if set.status != 0 {
            return Err(SharpError::ArchiveStatus {
                status: set.status,
                message: set.error.clone().unwrap_or_else(|| "no reason given".to_string()),
            });
        }
        Ok(set)
    }

    /// Values of one keyword column.
    pub fn keyword(&self, name: &str) -> SharpResult<&[String]> {
        self.keywords
            .iter()
            .find(|k| k.name == name)
            .map(|k| k.values.as_slice())
            .ok_or_else(|| SharpError::MissingKeyword(name.to_string()))
    }

    /// Storage paths of one segment column.
    pub fn segment_paths(&self, name: &str) -> SharpResult<Vec<SegmentPath>> {
        self.segments
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.iter().cloned().map(SegmentPath).collect())
            .ok_or_else(|| SharpError::MissingSegment(name.to_string()))
    }

    /// Record timestamps, parsed from the `T_REC` column in record order.
    ///
    /// Archive values carry seconds (`2017.09.03_00:00:00_TAI`); the
    /// positional parser reads the minute-resolution prefix and ignores the
    /// rest, matching the original's fixed-offset substring behavior.
    pub fn record_times(&self) -> SharpResult<Vec<TaiTimestamp>> {
        self.keyword(T_REC)?
            .iter()
            .map(|v| TaiTimestamp::parse(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": 0,
        "count": 2,
        "keywords": [
            {"name": "NOAA_ARS", "values": ["12673", "12673"]},
            {"name": "T_REC", "values": ["2017.09.03_00:00:00_TAI", "2017.09.03_04:00:00_TAI"]},
            {"name": "USFLUX", "values": ["1.1e22", "1.2e22"]}
        ],
        "segments": [
            {"name": "Br", "values": ["/SUM12/D111/S00000/Br.fits", "/SUM12/D112/S00000/Br.fits"]},
            {"name": "conf_disambig", "values": ["/SUM12/D111/S00000/conf_disambig.fits", "/SUM12/D112/S00000/conf_disambig.fits"]}
        ]
    }"#;

    #[test]
    fn test_parse_sample_response() {
        let set = RecordSet::from_json(SAMPLE).unwrap();
        assert_eq!(set.count, 2);
        assert_eq!(set.keywords.len(), 3);
        assert_eq!(set.segments.len(), 2);
    }

    #[test]
    fn test_keyword_lookup() {
        let set = RecordSet::from_json(SAMPLE).unwrap();
        assert_eq!(set.keyword("USFLUX").unwrap(), &["1.1e22", "1.2e22"]);
        assert!(matches!(
            set.keyword("MEANGAM"),
            Err(SharpError::MissingKeyword(_))
        ));
    }

    #[test]
    fn test_segment_paths_and_url_join() {
        let set = RecordSet::from_json(SAMPLE).unwrap();
        let paths = set.segment_paths("Br").unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(
            paths[0].to_url("http://jsoc.stanford.edu"),
            "http://jsoc.stanford.edu/SUM12/D111/S00000/Br.fits"
        );
        // Trailing slash on the base does not double up.
        assert_eq!(
            paths[0].to_url("http://jsoc.stanford.edu/"),
            "http://jsoc.stanford.edu/SUM12/D111/S00000/Br.fits"
        );
    }

    #[test]
    fn test_record_times_parse_seconds_suffix() {
        let set = RecordSet::from_json(SAMPLE).unwrap();
        let times = set.record_times().unwrap();
        assert_eq!(times.len(), 2);
        assert_eq!(times[0].to_string(), "2017.09.03_00:00_TAI");
        assert_eq!(times[1].hour(), 4);
    }

    #[test]
    fn test_nonzero_status_is_error() {
        let body = r#"{"status": 1, "error": "series not found"}"#;
        let err = RecordSet::from_json(body).unwrap_err();
        match err {
            SharpError::ArchiveStatus { status, message } => {
                assert_eq!(status, 1);
                assert_eq!(message, "series not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_segment_column() {
        let set = RecordSet::from_json(SAMPLE).unwrap();
        assert!(matches!(
            set.segment_paths("Bp"),
            Err(SharpError::MissingSegment(_))
        ));
    }
}
