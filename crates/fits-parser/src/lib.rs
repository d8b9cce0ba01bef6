//! FITS reader for archive image segments.
//!
//! This crate provides a pure Rust implementation of the subset of FITS
//! (Flexible Image Transport System) needed to decode magnetogram segments:
//! the primary HDU plus IMAGE extensions, uncompressed big-endian data in
//! BITPIX 8/16/32/-32/-64, and BSCALE/BZERO/BLANK handling.
//!
//! Archive segment files put the image in the first extension with a
//! minimal primary header in front of it, so the common call sequence is
//! `FitsFile::parse` followed by `first_image_extension`.

pub mod data;
pub mod header;

use bytes::Bytes;
use thiserror::Error;

use sharp_common::SharpError;

pub use data::Bitpix;
pub use header::{CardValue, Header};

/// FITS files are laid out in fixed 2880-byte blocks; both headers and
/// data areas are padded to a block boundary.
pub const BLOCK_SIZE: usize = 2880;

/// Each header card occupies exactly 80 bytes.
pub const CARD_SIZE: usize = 80;

/// Result type for FITS parser operations.
pub type FitsResult<T> = Result<T, FitsError>;

/// Error types for FITS parsing.
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("Truncated file: {0}")]
    Truncated(String),

    #[error("Invalid header card: {0}")]
    InvalidCard(String),

    #[error("Missing required keyword: {0}")]
    MissingKeyword(String),

    #[error("Keyword {keyword} has unexpected type: {found}")]
    WrongType { keyword: String, found: String },

    #[error("Unsupported BITPIX value: {0}")]
    UnsupportedBitpix(i64),

    #[error("HDU is not a 2-D image: {0}")]
    NotAnImage(String),
}

impl From<FitsError> for SharpError {
    fn from(err: FitsError) -> Self {
        match err {
            FitsError::NotAnImage(msg) => SharpError::NotAnImage(msg),
            other => SharpError::FitsParse(other.to_string()),
        }
    }
}

/// Kind of header-data unit, from the first card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HduKind {
    /// Primary HDU (`SIMPLE = T`).
    Primary,
    /// `XTENSION= 'IMAGE   '` extension.
    Image,
    /// Any other extension type (table, etc.); carried but not decodable.
    Other,
}

/// One header-data unit: parsed header plus its raw data area.
#[derive(Debug, Clone)]
pub struct Hdu {
    pub kind: HduKind,
    pub header: Header,
    pub data: Bytes,
}

/// A parsed FITS file: primary HDU followed by any extensions.
#[derive(Debug, Clone)]
pub struct FitsFile {
    pub hdus: Vec<Hdu>,
}

impl FitsFile {
    /// Parse every HDU in the file.
    pub fn parse(bytes: Bytes) -> FitsResult<Self> {
        let mut hdus = Vec::new();
        let mut offset = 0;

        while offset < bytes.len() {
            // Trailing padding blocks of NULs or spaces after the last HDU
            // appear in some writers; stop quietly if no card starts here.
            if bytes[offset..].iter().take(CARD_SIZE).all(|&b| b == b' ' || b == 0) {
                break;
            }

            let (header, header_len) = Header::parse(&bytes[offset..])
                .map_err(|e| annotate_hdu_error(e, hdus.len()))?;

            let kind = if hdus.is_empty() {
                primary_kind(&header)?
            } else {
                extension_kind(&header)
            };

            let data_len = header.data_area_len()?;
            let data_start = offset + header_len;
            let data_end = data_start + data_len;
            if data_end > bytes.len() {
                return Err(FitsError::Truncated(format!(
                    "HDU {} data area runs past end of file ({} > {})",
                    hdus.len(),
                    data_end,
                    bytes.len()
                )));
            }

            hdus.push(Hdu {
                kind,
                header,
                data: bytes.slice(data_start..data_end),
            });

            // Advance past the block padding behind the data area.
            offset = data_start + data_len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        }

        if hdus.is_empty() {
            return Err(FitsError::Truncated("no HDUs found".to_string()));
        }

        Ok(Self { hdus })
    }

    /// The HDU the pipeline decodes: the first IMAGE extension, or the
    /// primary HDU when it carries the data itself.
    pub fn first_image_extension(&self) -> FitsResult<&Hdu> {
        if let Some(hdu) = self.hdus.iter().skip(1).find(|h| h.kind == HduKind::Image) {
            return Ok(hdu);
        }
        if let Some(primary) = self.hdus.first().filter(|h| !h.data.is_empty()) {
            return Ok(primary);
        }
        Err(FitsError::NotAnImage(
            "file has no image extension and an empty primary HDU".to_string(),
        ))
    }
}

fn primary_kind(header: &Header) -> FitsResult<HduKind> {
    match header.logical("SIMPLE") {
        Ok(_) => Ok(HduKind::Primary),
        Err(_) => Err(FitsError::InvalidCard(
            "first HDU does not begin with SIMPLE".to_string(),
        )),
    }
}

fn extension_kind(header: &Header) -> HduKind {
    match header.string("XTENSION") {
        Ok(name) if name.trim() == "IMAGE" => HduKind::Image,
        _ => HduKind::Other,
    }
}

fn annotate_hdu_error(err: FitsError, hdu_index: usize) -> FitsError {
    match err {
        FitsError::Truncated(msg) => FitsError::Truncated(format!("HDU {}: {}", hdu_index, msg)),
        other => other,
    }
}
