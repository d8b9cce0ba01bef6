//! JSOC/DRMS archive protocol implementation.
//!
//! Supports:
//! - Record-set query construction for SHARP series
//! - `jsoc_info op=rs_list` JSON response parsing (keyword and segment tables)

pub mod query;
pub mod response;

pub use query::{Cadence, CadenceUnit, RecordSetQuery, DEFAULT_SERIES};
pub use response::{KeywordColumn, RecordSet, SegmentColumn, SegmentPath};

/// Keywords requested with every record-set listing.
pub const DEFAULT_KEYS: &[&str] = &["NOAA_ARS", "T_REC", "USFLUX", "ERRVF"];

/// Segments requested with every record-set listing.
pub const DEFAULT_SEGMENTS: &[&str] = &["Br", "conf_disambig"];
