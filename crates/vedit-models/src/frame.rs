//! Frames and pipeline artifacts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefix of captured frame files inside the workspace.
pub const FRAME_FILE_PREFIX: &str = "frame-";

/// Minimum zero-padding of frame file indices.
pub const MIN_FRAME_INDEX_WIDTH: usize = 3;

/// Zero-padding width needed to index `frame_count` frames.
pub fn frame_index_width(frame_count: u32) -> usize {
    let last = frame_count.saturating_sub(1);
    last.to_string().len().max(MIN_FRAME_INDEX_WIDTH)
}

/// File name of the frame at `index` for a run of `frame_count` frames.
pub fn frame_filename(index: u32, frame_count: u32) -> String {
    format!(
        "{}{:0width$}.png",
        FRAME_FILE_PREFIX,
        index,
        width = frame_index_width(frame_count)
    )
}

/// One captured raster at a sequence index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Frame {
    /// Sequence index in `[0, frame_count)`
    pub index: u32,
    /// Nominal capture time in seconds (`index / frame_rate`)
    pub timestamp: f64,
    /// PNG file inside the workspace
    pub path: PathBuf,
}

impl Frame {
    /// Create a frame with its nominal timestamp derived from `frame_rate`.
    pub fn new(index: u32, frame_rate: u32, path: impl Into<PathBuf>) -> Self {
        let timestamp = if frame_rate == 0 {
            0.0
        } else {
            index as f64 / frame_rate as f64
        };
        Self {
            index,
            timestamp,
            path: path.into(),
        }
    }
}

/// Pipeline stage that produces an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Render,
    Normalize,
    Encode,
    Segment,
    Concat,
    Overlay,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Render => "render",
            Stage::Normalize => "normalize",
            Stage::Encode => "encode",
            Stage::Segment => "segment",
            Stage::Concat => "concat",
            Stage::Overlay => "overlay",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file produced by exactly one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Artifact {
    pub producer: Stage,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(producer: Stage, path: impl Into<PathBuf>) -> Self {
        Self {
            producer,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_filename_padding() {
        assert_eq!(frame_filename(0, 60), "frame-000.png");
        assert_eq!(frame_filename(59, 60), "frame-059.png");
        assert_eq!(frame_filename(7, 1500), "frame-0007.png");
    }

    #[test]
    fn test_frame_timestamp() {
        let frame = Frame::new(10, 20, "frame-010.png");
        assert!((frame.timestamp - 0.5).abs() < f64::EPSILON);
    }
}
