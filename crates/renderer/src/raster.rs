//! Rasterization of frames into RGBA pixel buffers.

use rayon::prelude::*;
use tracing::debug;

use sharp_common::{Frame, FrameStack};

use crate::colormap::{seismic_reversed, Color};
use crate::{RenderError, RenderResult};

/// Default color-scale limit in Gauss for radial-field maps.
pub const DEFAULT_FIELD_LIMIT: f32 = 1500.0;

/// Fixed symmetric color scale: values map linearly from -limit..+limit
/// onto the colormap, saturating beyond it.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricRange {
    limit: f32,
}

impl SymmetricRange {
    /// A scale of ±limit. Non-positive limits fall back to the default.
    pub fn new(limit: f32) -> Self {
        if limit > 0.0 && limit.is_finite() {
            Self { limit }
        } else {
            Self { limit: DEFAULT_FIELD_LIMIT }
        }
    }

    /// Pick a scale from the data itself: ±(largest absolute value).
    pub fn from_stack(stack: &FrameStack) -> Self {
        Self::new(stack.max_abs().unwrap_or(DEFAULT_FIELD_LIMIT))
    }

    pub fn limit(&self) -> f32 {
        self.limit
    }

    /// Map a field value to [0, 1], or None for missing pixels.
    pub fn normalize(&self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        Some(((value + self.limit) / (2.0 * self.limit)).clamp(0.0, 1.0))
    }
}

impl Default for SymmetricRange {
    fn default() -> Self {
        Self { limit: DEFAULT_FIELD_LIMIT }
    }
}

/// Render one frame as RGBA pixel data (4 bytes per pixel).
///
/// Missing pixels render transparent.
pub fn render_frame(frame: &Frame, range: &SymmetricRange) -> Vec<u8> {
    let mut pixels = vec![0u8; frame.width() * frame.height() * 4];

    for (pixel, value) in pixels.chunks_exact_mut(4).zip(frame.data()) {
        let color = match range.normalize(*value) {
            Some(norm) => seismic_reversed(norm),
            None => Color::transparent(),
        };
        pixel[0] = color.r;
        pixel[1] = color.g;
        pixel[2] = color.b;
        pixel[3] = color.a;
    }

    pixels
}

/// Render every frame of a stack, in order.
///
/// Frames are independent, so this fans out across cores.
pub fn render_stack(stack: &FrameStack, range: &SymmetricRange) -> RenderResult<Vec<Vec<u8>>> {
    if stack.is_empty() {
        return Err(RenderError::EmptyStack("frame stack is empty".to_string()));
    }

    debug!(
        frames = stack.len(),
        limit = range.limit(),
        "rasterizing frame stack"
    );

    let frames: Vec<&Frame> = stack.iter().collect();
    Ok(frames
        .par_iter()
        .map(|frame| render_frame(frame, range))
        .collect())
}
