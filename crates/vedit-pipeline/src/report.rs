//! Run report.

use serde::Serialize;
use std::path::PathBuf;

use vedit_media::{CaptureFailure, CleanupFailure, NormalizeFailure};
use vedit_models::Artifact;

/// Outcome of one clip job.
#[derive(Debug, Clone, Serialize)]
pub struct ClipOutcome {
    pub index: usize,
    pub name: String,
    pub effect: String,
    /// Output path inside the workspace when the job succeeded
    pub output: Option<PathBuf>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ClipOutcome {
    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: String,
    /// Final artifacts at their destination paths
    pub outputs: Vec<Artifact>,
    /// Indices of the frames that made it into the GIF
    pub frames: Vec<u32>,
    pub capture_failures: Vec<CaptureFailure>,
    pub normalize_failures: Vec<NormalizeFailure>,
    /// Clip outcomes in list order
    pub clips: Vec<ClipOutcome>,
    pub cleanup_failures: Vec<CleanupFailure>,
    pub elapsed_ms: u64,
}

impl PipelineReport {
    /// Path of the artifact produced by `stage`, if any.
    pub fn output(&self, stage: vedit_models::Stage) -> Option<&PathBuf> {
        self.outputs
            .iter()
            .find(|a| a.producer == stage)
            .map(|a| &a.path)
    }
}
