//! Decoding HDU data areas into frames.
//!
//! FITS stores array data big-endian. Integer types apply the linear
//! BSCALE/BZERO transform and map the BLANK sentinel to NaN; floating
//! types carry NaN natively.

use tracing::debug;

use sharp_common::Frame;

use crate::{FitsError, FitsResult, Hdu, Header};

/// Supported BITPIX data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitpix {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

impl Bitpix {
    pub fn from_keyword(value: i64) -> FitsResult<Self> {
        match value {
            8 => Ok(Bitpix::U8),
            16 => Ok(Bitpix::I16),
            32 => Ok(Bitpix::I32),
            -32 => Ok(Bitpix::F32),
            -64 => Ok(Bitpix::F64),
            other => Err(FitsError::UnsupportedBitpix(other)),
        }
    }

    pub fn bytes_per_value(&self) -> usize {
        match self {
            Bitpix::U8 => 1,
            Bitpix::I16 => 2,
            Bitpix::I32 | Bitpix::F32 => 4,
            Bitpix::F64 => 8,
        }
    }

    fn is_integer(&self) -> bool {
        matches!(self, Bitpix::U8 | Bitpix::I16 | Bitpix::I32)
    }
}

impl Hdu {
    /// Decode this HDU's data area as a 2-D f32 frame.
    pub fn to_frame(&self) -> FitsResult<Frame> {
        let axes = self.header.axes()?;
        let [width, height] = axes[..] else {
            return Err(FitsError::NotAnImage(format!(
                "expected 2 axes, found {}",
                axes.len()
            )));
        };

        let bitpix = Bitpix::from_keyword(self.header.integer("BITPIX")?)?;
        let nelem = width * height;
        let expected = nelem * bitpix.bytes_per_value();
        if self.data.len() < expected {
            return Err(FitsError::Truncated(format!(
                "data area holds {} bytes, image needs {}",
                self.data.len(),
                expected
            )));
        }

        let bscale = real_or(&self.header, "BSCALE", 1.0)?;
        let bzero = real_or(&self.header, "BZERO", 0.0)?;
        let blank = if bitpix.is_integer() {
            optional_integer(&self.header, "BLANK")?
        } else {
            None
        };

        debug!(
            width,
            height,
            ?bitpix,
            bscale,
            bzero,
            blank = ?blank,
            "decoding image HDU"
        );

        let raw = &self.data[..expected];
        let scale = |v: f64| (bscale * v + bzero) as f32;
        let scale_int = |v: i64| {
            if blank == Some(v) {
                f32::NAN
            } else {
                scale(v as f64)
            }
        };

        let values: Vec<f32> = match bitpix {
            Bitpix::U8 => raw.iter().map(|&b| scale_int(b as i64)).collect(),
            Bitpix::I16 => raw
                .chunks_exact(2)
                .map(|c| scale_int(i16::from_be_bytes([c[0], c[1]]) as i64))
                .collect(),
            Bitpix::I32 => raw
                .chunks_exact(4)
                .map(|c| scale_int(i32::from_be_bytes([c[0], c[1], c[2], c[3]]) as i64))
                .collect(),
            Bitpix::F32 => raw
                .chunks_exact(4)
                .map(|c| scale(f32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64))
                .collect(),
            Bitpix::F64 => raw
                .chunks_exact(8)
                .map(|c| {
                    scale(f64::from_be_bytes([
                        c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7],
                    ]))
                })
                .collect(),
        };

        Frame::new(width, height, values)
            .map_err(|e| FitsError::NotAnImage(e.to_string()))
    }
}

fn real_or(header: &Header, keyword: &str, default: f64) -> FitsResult<f64> {
    match header.real(keyword) {
        Ok(v) => Ok(v),
        Err(FitsError::MissingKeyword(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

fn optional_integer(header: &Header, keyword: &str) -> FitsResult<Option<i64>> {
    match header.integer(keyword) {
        Ok(v) => Ok(Some(v)),
        Err(FitsError::MissingKeyword(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
