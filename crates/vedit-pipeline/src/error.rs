//! Pipeline error types.
//!
//! Every variant is fatal for the run. Non-fatal outcomes (capture gaps,
//! normalization misses, cleanup failures) are reported as data in
//! [`crate::report::PipelineReport`] instead.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use vedit_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// A clip job that did not produce its artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ClipFailure {
    /// Position in the clip list
    pub index: usize,
    pub name: String,
    pub error: String,
}

impl fmt::Display for ClipFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} '{}': {}", self.index, self.name, self.error)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workspace error: {0}")]
    Workspace(#[source] MediaError),

    #[error("Rendering surface unavailable: {0}")]
    Connection(#[source] MediaError),

    #[error("Animated image encoding failed: {0}")]
    Encode(#[source] MediaError),

    #[error("{} clip job(s) failed: {}", .failures.len(), join_failures(.failures))]
    Segment { failures: Vec<ClipFailure> },

    #[error("Concatenation failed: {0}")]
    Concat(#[source] MediaError),

    #[error("Overlay failed: {0}")]
    Overlay(#[source] MediaError),

    #[error("Could not place final output: {0}")]
    Output(#[source] MediaError),

    #[error("Run exceeded its deadline of {0:.1} seconds")]
    DeadlineExceeded(f64),
}

fn join_failures(failures: &[ClipFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short stable label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Workspace(_) => "workspace",
            Self::Connection(_) => "connection",
            Self::Encode(_) => "encode",
            Self::Segment { .. } => "segment",
            Self::Concat(_) => "concat",
            Self::Overlay(_) => "overlay",
            Self::Output(_) => "output",
            Self::DeadlineExceeded(_) => "deadline",
        }
    }

    /// Stderr of the failing external tool, when there is one.
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            Self::Workspace(e)
            | Self::Connection(e)
            | Self::Encode(e)
            | Self::Concat(e)
            | Self::Overlay(e)
            | Self::Output(e) => e.stderr(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_error_lists_every_failure() {
        let err = PipelineError::Segment {
            failures: vec![
                ClipFailure {
                    index: 0,
                    name: "first".into(),
                    error: "boom".into(),
                },
                ClipFailure {
                    index: 2,
                    name: "third".into(),
                    error: "bang".into(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("2 clip job(s) failed"));
        assert!(message.contains("#0 'first': boom"));
        assert!(message.contains("#2 'third': bang"));
        assert_eq!(err.kind(), "segment");
    }

    #[test]
    fn test_tool_stderr_is_exposed() {
        let err = PipelineError::Overlay(MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("Invalid argument".into()),
            Some(1),
        ));
        assert_eq!(err.tool_stderr(), Some("Invalid argument"));
        assert!(PipelineError::DeadlineExceeded(2.0).tool_stderr().is_none());
    }
}
