//! MP4 encoding of rendered frame sequences.
//!
//! # Implementation Notes
//!
//! Frames are piped as raw RGBA video to an `ffmpeg` subprocess, which
//! encodes H.264 in yuv420p for broad player support. ffmpeg must be on
//! PATH; a missing binary surfaces as `EncoderUnavailable` before any
//! output file is touched.
//!
//! Export is atomic: ffmpeg writes to a `.partial` path that is renamed
//! over the target only after the encoder exits cleanly, and removed on
//! every failure path.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::{RenderError, RenderResult};

/// Playback interval between frames, in milliseconds.
pub const FRAME_INTERVAL_MS: u32 = 50;

/// How long the final frame is held before the loop point, in milliseconds.
pub const REPEAT_DELAY_MS: u32 = 1000;

/// Encodes RGBA frame sequences to MP4.
#[derive(Debug, Clone)]
pub struct Mp4Encoder {
    frame_interval_ms: u32,
    repeat_delay_ms: u32,
    ffmpeg: PathBuf,
}

impl Default for Mp4Encoder {
    fn default() -> Self {
        Self {
            frame_interval_ms: FRAME_INTERVAL_MS,
            repeat_delay_ms: REPEAT_DELAY_MS,
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl Mp4Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific ffmpeg binary instead of the one on PATH.
    pub fn with_ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = path.into();
        self
    }

    /// Frames per second implied by the frame interval.
    pub fn frame_rate(&self) -> u32 {
        (1000 / self.frame_interval_ms).max(1)
    }

    /// Number of times the last frame is repeated to hold it for the
    /// repeat delay.
    fn trailing_repeats(&self) -> usize {
        (self.repeat_delay_ms / self.frame_interval_ms) as usize
    }

    /// Check that the encoder binary can be spawned at all.
    pub fn check_available(&self) -> RenderResult<()> {
        let status = Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| {
                RenderError::EncoderUnavailable(format!(
                    "failed to run {}: {}",
                    self.ffmpeg.display(),
                    e
                ))
            })?;
        if !status.success() {
            return Err(RenderError::EncoderUnavailable(format!(
                "{} -version exited with {}",
                self.ffmpeg.display(),
                status
            )));
        }
        Ok(())
    }

    /// Encode RGBA frames to an MP4 file at `output`.
    ///
    /// Every frame must be `width * height * 4` bytes. The final frame is
    /// held for the repeat delay, then the file ends (players looping the
    /// file reproduce the original viewer's pause-then-restart behavior).
    pub fn encode(
        &self,
        frames: &[Vec<u8>],
        width: usize,
        height: usize,
        output: &Path,
    ) -> RenderResult<()> {
        if frames.is_empty() {
            return Err(RenderError::EmptyStack("no frames to encode".to_string()));
        }
        let frame_bytes = width * height * 4;
        if let Some(bad) = frames.iter().position(|f| f.len() != frame_bytes) {
            return Err(RenderError::EncoderFailed(format!(
                "frame {} has {} bytes, expected {}",
                bad,
                frames[bad].len(),
                frame_bytes
            )));
        }

        self.check_available()?;

        let partial = partial_path(output);
        let result = self.run_ffmpeg(frames, width, height, &partial);

        match result {
            Ok(()) => {
                std::fs::rename(&partial, output)?;
                info!(path = %output.display(), frames = frames.len(), "wrote MP4");
                Ok(())
            }
            Err(e) => {
                // Never leave partial output behind.
                let _ = std::fs::remove_file(&partial);
                Err(e)
            }
        }
    }

    fn run_ffmpeg(
        &self,
        frames: &[Vec<u8>],
        width: usize,
        height: usize,
        partial: &Path,
    ) -> RenderResult<()> {
        debug!(
            frames = frames.len(),
            width,
            height,
            fps = self.frame_rate(),
            "spawning ffmpeg"
        );

        let size = format!("{}x{}", width, height);
        let rate = self.frame_rate().to_string();

        let mut child = Command::new(&self.ffmpeg)
            .args(["-y", "-loglevel", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", size.as_str()])
            .args(["-r", rate.as_str()])
            .args(["-i", "-"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            // libx264 requires even dimensions; pad the odd edge if needed.
            .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .args(["-movflags", "+faststart"])
            .arg(partial)
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| {
                RenderError::EncoderUnavailable(format!(
                    "failed to spawn {}: {}",
                    self.ffmpeg.display(),
                    e
                ))
            })?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| RenderError::EncoderFailed("no stdin pipe".to_string()))?;
            for frame in frames {
                stdin.write_all(frame)?;
            }
            if let Some(last) = frames.last() {
                for _ in 0..self.trailing_repeats() {
                    stdin.write_all(last)?;
                }
            }
        }
        // Close stdin so ffmpeg sees EOF and finalizes the file.
        drop(child.stdin.take());

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(RenderError::EncoderFailed(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_from_interval() {
        let encoder = Mp4Encoder::new();
        assert_eq!(encoder.frame_rate(), 20);
        assert_eq!(encoder.trailing_repeats(), 20);
    }

    #[test]
    fn test_partial_path_keeps_directory() {
        let p = partial_path(Path::new("movies/7117_a_b.mp4"));
        assert_eq!(p, PathBuf::from("movies/7117_a_b.mp4.partial"));
    }

    #[test]
    fn test_empty_frames_rejected() {
        let encoder = Mp4Encoder::new();
        let err = encoder
            .encode(&[], 2, 2, Path::new("/tmp/never-written.mp4"))
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyStack(_)));
    }

    #[test]
    fn test_mismatched_frame_size_rejected() {
        let encoder = Mp4Encoder::new();
        let frames = vec![vec![0u8; 16], vec![0u8; 12]];
        let err = encoder
            .encode(&frames, 2, 2, Path::new("/tmp/never-written.mp4"))
            .unwrap_err();
        assert!(matches!(err, RenderError::EncoderFailed(_)));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let encoder = Mp4Encoder::new().with_ffmpeg("/nonexistent/ffmpeg-binary");
        let frames = vec![vec![0u8; 16]];
        let dir = tempfile::tempdir().unwrap();
        let err = encoder
            .encode(&frames, 2, 2, &dir.path().join("out.mp4"))
            .unwrap_err();
        assert!(matches!(err, RenderError::EncoderUnavailable(_)));
        // Nothing was left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
