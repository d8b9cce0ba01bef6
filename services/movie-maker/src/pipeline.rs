//! Sequential fetch-decode-stack pipeline and the movie operations.
//!
//! Control flow matches the archive's access pattern: one record listing,
//! then one segment download per record, strictly in order. A record
//! without a usable segment aborts the whole assembly; a movie with a
//! silently missing frame would misrepresent the series.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use drms_protocol::{RecordSetQuery, DEFAULT_KEYS, DEFAULT_SEGMENTS};
use fits_parser::FitsFile;
use renderer::{render_stack, Mp4Encoder, SymmetricRange, FRAME_INTERVAL_MS, REPEAT_DELAY_MS};
use sharp_common::{FrameStack, HarpId, SharpError, SharpResult, TaiTimestamp};

use crate::client::DrmsClient;

/// Segment animated when none is chosen: the radial field map.
pub const DEFAULT_SEGMENT: &str = "Br";

/// An assembled movie: the decoded frame stack plus the metadata needed
/// to preview or export it.
#[derive(Debug)]
pub struct Movie {
    harp: HarpId,
    query: RecordSetQuery,
    times: Vec<TaiTimestamp>,
    stack: FrameStack,
    range: SymmetricRange,
}

/// In-memory frame-by-frame viewer over a rendered movie.
#[derive(Debug)]
pub struct Preview {
    width: usize,
    height: usize,
    frames: Vec<Vec<u8>>,
    times: Vec<TaiTimestamp>,
}

impl Preview {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// RGBA pixels of one frame.
    pub fn frame_rgba(&self, index: usize) -> Option<&[u8]> {
        self.frames.get(index).map(|f| f.as_slice())
    }

    /// One frame encoded as PNG.
    pub fn frame_png(&self, index: usize) -> SharpResult<Vec<u8>> {
        let frame = self
            .frames
            .get(index)
            .ok_or_else(|| SharpError::InvalidQuery(format!("no frame {}", index)))?;
        renderer::png::encode_rgba(frame, self.width, self.height).map_err(SharpError::from)
    }

    pub fn timestamp(&self, index: usize) -> Option<&TaiTimestamp> {
        self.times.get(index)
    }

    /// Wall-clock offset within one loop at which a frame is shown.
    pub fn display_offset_ms(&self, index: usize) -> Option<u32> {
        if index >= self.frames.len() {
            return None;
        }
        Some(index as u32 * FRAME_INTERVAL_MS)
    }

    /// Total loop duration: every frame interval plus the repeat delay.
    pub fn loop_duration_ms(&self) -> u32 {
        self.frames.len() as u32 * FRAME_INTERVAL_MS + REPEAT_DELAY_MS
    }
}

impl Movie {
    pub fn harp(&self) -> HarpId {
        self.harp
    }

    pub fn query(&self) -> &RecordSetQuery {
        &self.query
    }

    pub fn times(&self) -> &[TaiTimestamp] {
        &self.times
    }

    pub fn stack(&self) -> &FrameStack {
        &self.stack
    }

    /// Display title, carried into logs and exports.
    pub fn title(&self) -> String {
        format!("Flux Emergence over Time for Active Region {}", self.harp)
    }

    /// File name the export operation writes: region, start, and end
    /// joined with underscores, timestamps in their archive form.
    pub fn export_file_name(&self) -> String {
        let range = self.query.range();
        format!("{}_{}_{}.mp4", self.harp, range.start, range.end)
    }

    /// Render the stack into an in-memory frame-by-frame viewer.
    pub fn preview(&self) -> SharpResult<Preview> {
        let (width, height) = self
            .stack
            .dimensions()
            .ok_or_else(|| SharpError::InvalidQuery("movie has no frames".to_string()))?;

        let frames = render_stack(&self.stack, &self.range)?;
        Ok(Preview {
            width,
            height,
            frames,
            times: self.times.clone(),
        })
    }

    /// Export the movie as MP4 into `output_dir`, returning the written
    /// path.
    pub fn export(&self, output_dir: &Path) -> SharpResult<PathBuf> {
        let (width, height) = self
            .stack
            .dimensions()
            .ok_or_else(|| SharpError::InvalidQuery("movie has no frames".to_string()))?;

        std::fs::create_dir_all(output_dir)?;
        let output = output_dir.join(self.export_file_name());

        let frames = render_stack(&self.stack, &self.range)?;
        Mp4Encoder::new().encode(&frames, width, height, &output)?;

        info!(title = %self.title(), path = %output.display(), "export complete");
        Ok(output)
    }
}

/// Fetch and decode every frame for a query.
///
/// One frame per metadata row, downloaded and decoded one at a time in
/// record order.
pub async fn assemble(
    client: &DrmsClient,
    query: &RecordSetQuery,
    segment: &str,
    scale_limit: Option<f32>,
) -> SharpResult<Movie> {
    info!(ds = %query, segment, "listing records");

    let segments: Vec<&str> = if DEFAULT_SEGMENTS.contains(&segment) {
        DEFAULT_SEGMENTS.to_vec()
    } else {
        vec![segment]
    };
    let set = client.list_records(query, DEFAULT_KEYS, &segments).await?;

    let times = set.record_times()?;
    let paths = set.segment_paths(segment)?;
    if paths.len() != times.len() {
        return Err(SharpError::RecordMismatch {
            rows: times.len(),
            paths: paths.len(),
        });
    }

    info!(records = times.len(), "downloading segments");

    let mut stack = FrameStack::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        debug!(record = i, time = %times[i], "fetching frame");
        let bytes = client.fetch_segment(path).await?;
        let fits = FitsFile::parse(bytes)?;
        let frame = fits.first_image_extension()?.to_frame()?;
        stack.push(frame)?;
    }

    // One frame per metadata row, by construction; keep the invariant
    // visible to callers anyway.
    debug_assert_eq!(stack.len(), times.len());

    let range = match scale_limit {
        Some(limit) => SymmetricRange::new(limit),
        None => SymmetricRange::default(),
    };

    Ok(Movie {
        harp: query.harp(),
        query: query.clone(),
        times,
        stack,
        range,
    })
}
