//! Error types for sharp-movie crates and services.

use thiserror::Error;

/// Result type alias using SharpError.
pub type SharpResult<T> = Result<T, SharpError>;

/// Primary error type for the magnetogram movie pipeline.
#[derive(Debug, Error)]
pub enum SharpError {
    // === Malformed input ===
    #[error("Malformed TAI timestamp '{input}': {message}")]
    MalformedTimestamp { input: String, message: String },

    #[error("Malformed cadence '{0}': expected <count><s|m|h|d>, e.g. 4h")]
    MalformedCadence(String),

    #[error("Invalid time range: end {end} is before start {start}")]
    InvalidTimeRange { start: String, end: String },

    #[error("Invalid record-set query: {0}")]
    InvalidQuery(String),

    // === Retrieval failures ===
    #[error("Archive request failed: {0}")]
    Http(String),

    #[error("Archive reported failure status {status}: {message}")]
    ArchiveStatus { status: i64, message: String },

    #[error("Keyword not present in archive response: {0}")]
    MissingKeyword(String),

    #[error("Segment not present in archive response: {0}")]
    MissingSegment(String),

    #[error("Archive returned {rows} metadata rows but {paths} segment paths")]
    RecordMismatch { rows: usize, paths: usize },

    // === Decode failures ===
    #[error("Failed to parse FITS data: {0}")]
    FitsParse(String),

    #[error("HDU does not contain a 2-D image: {0}")]
    NotAnImage(String),

    #[error("Frame dimensions {got_width}x{got_height} do not match stack {want_width}x{want_height}")]
    DimensionMismatch {
        got_width: usize,
        got_height: usize,
        want_width: usize,
        want_height: usize,
    },

    // === Export failures ===
    #[error("Video encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("Video encoder failed: {0}")]
    EncoderFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SharpError {
    /// Coarse failure class, used for log fields and exit reporting.
    pub fn class(&self) -> &'static str {
        match self {
            SharpError::MalformedTimestamp { .. }
            | SharpError::MalformedCadence(_)
            | SharpError::InvalidTimeRange { .. }
            | SharpError::InvalidQuery(_) => "malformed-input",

            SharpError::Http(_)
            | SharpError::ArchiveStatus { .. }
            | SharpError::MissingKeyword(_)
            | SharpError::MissingSegment(_)
            | SharpError::RecordMismatch { .. } => "retrieval",

            SharpError::FitsParse(_)
            | SharpError::NotAnImage(_)
            | SharpError::DimensionMismatch { .. } => "decode",

            SharpError::EncoderUnavailable(_)
            | SharpError::EncoderFailed(_)
            | SharpError::Io(_) => "export",
        }
    }
}

impl From<serde_json::Error> for SharpError {
    fn from(err: serde_json::Error) -> Self {
        SharpError::Http(format!("JSON error: {}", err))
    }
}
