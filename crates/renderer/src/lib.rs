//! Image rendering for magnetogram visualization.
//!
//! Implements the visual pipeline for frame stacks:
//! - Diverging red-white-blue colormap over a symmetric field range
//! - Grid-to-RGBA rasterization
//! - PNG encoding of individual frames
//! - MP4 encoding of a whole stack via an ffmpeg subprocess

pub mod colormap;
pub mod mp4;
pub mod png;
pub mod raster;

pub use colormap::{seismic_reversed, Color};
pub use mp4::{Mp4Encoder, FRAME_INTERVAL_MS, REPEAT_DELAY_MS};
pub use raster::{render_frame, render_stack, SymmetricRange};

use thiserror::Error;

use sharp_common::SharpError;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Error types for rendering and encoding.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render: {0}")]
    EmptyStack(String),

    #[error("PNG encoding failed: {0}")]
    PngEncode(String),

    #[error("ffmpeg not available: {0}")]
    EncoderUnavailable(String),

    #[error("ffmpeg failed: {0}")]
    EncoderFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RenderError> for SharpError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::EncoderUnavailable(msg) => SharpError::EncoderUnavailable(msg),
            RenderError::EncoderFailed(msg) => SharpError::EncoderFailed(msg),
            RenderError::Io(e) => SharpError::Io(e),
            other => SharpError::EncoderFailed(other.to_string()),
        }
    }
}
