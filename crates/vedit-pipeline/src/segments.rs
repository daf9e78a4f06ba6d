//! Base video branch: concurrent clip jobs, then an ordered concat.

use futures::future::join_all;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::Semaphore;

use vedit_media::{VideoFilter, Workspace};
use vedit_models::{Clip, Stage};

use crate::error::{ClipFailure, PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::report::ClipOutcome;

/// Concatenated base video inside the workspace.
pub const CONCAT_ARTIFACT: &str = "concat.mp4";

#[derive(Debug, Clone)]
pub struct BaseVideo {
    pub path: PathBuf,
    pub clips: Vec<ClipOutcome>,
}

/// Run every clip job, at most `max_concurrent` at a time.
///
/// Waits for all jobs. Outcomes are returned in list order whatever the
/// completion order was.
pub async fn process_clips(
    filter: &dyn VideoFilter,
    clips: &[Clip],
    workspace: &Workspace,
    max_concurrent: usize,
    logger: &RunLogger,
) -> Vec<ClipOutcome> {
    let semaphore = Semaphore::new(max_concurrent.max(1));

    let jobs = clips.iter().enumerate().map(|(index, clip)| {
        let output = workspace.artifact_path(clip.output_filename(index));
        let semaphore = &semaphore;
        async move {
            let started = Instant::now();
            let result = match semaphore.acquire().await {
                Ok(_permit) => filter.extract_clip(clip, &output).await.map_err(|e| e.to_string()),
                Err(e) => Err(format!("Clip scheduler closed: {e}")),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;
            metrics::record_clip(clip.effect.as_str(), result.is_ok());

            match result {
                Ok(()) => {
                    logger.log_progress(&format!(
                        "Clip #{} '{}' ready in {} ms",
                        index, clip.name, elapsed_ms
                    ));
                    ClipOutcome {
                        index,
                        name: clip.name.clone(),
                        effect: clip.effect.to_string(),
                        output: Some(output),
                        error: None,
                        elapsed_ms,
                    }
                }
                Err(error) => {
                    logger.log_error(&format!("Clip #{} '{}' failed: {}", index, clip.name, error));
                    ClipOutcome {
                        index,
                        name: clip.name.clone(),
                        effect: clip.effect.to_string(),
                        output: None,
                        error: Some(error),
                        elapsed_ms,
                    }
                }
            }
        }
    });

    join_all(jobs).await
}

/// Produce the base video: all clips, then concat in list order.
///
/// Any failed clip skips the concat and fails the branch.
pub async fn build_base_video(
    filter: &dyn VideoFilter,
    clips: &[Clip],
    workspace: &Workspace,
    max_concurrent: usize,
    logger: &RunLogger,
) -> PipelineResult<BaseVideo> {
    let logger = logger.child("segments");
    logger.log_start(&format!(
        "Processing {} clips (max {} concurrent)",
        clips.len(),
        max_concurrent
    ));

    let started = Instant::now();
    let outcomes = process_clips(filter, clips, workspace, max_concurrent, &logger).await;
    metrics::record_stage_duration(Stage::Segment.as_str(), started.elapsed().as_secs_f64());

    let failures: Vec<ClipFailure> = outcomes
        .iter()
        .filter(|o| !o.succeeded())
        .map(|o| ClipFailure {
            index: o.index,
            name: o.name.clone(),
            error: o.error.clone().unwrap_or_default(),
        })
        .collect();
    if !failures.is_empty() {
        logger.log_error(&format!(
            "{} of {} clips failed, skipping concatenation",
            failures.len(),
            outcomes.len()
        ));
        return Err(PipelineError::Segment { failures });
    }

    let inputs: Vec<PathBuf> = outcomes.iter().filter_map(|o| o.output.clone()).collect();

    let started = Instant::now();
    let path = workspace.artifact_path(CONCAT_ARTIFACT);
    filter
        .concat(&inputs, &workspace.concat_list_path(), &path)
        .await
        .map_err(PipelineError::Concat)?;
    metrics::record_stage_duration(Stage::Concat.as_str(), started.elapsed().as_secs_f64());

    logger.log_completion(&format!("Concatenated {} clips", inputs.len()));
    Ok(BaseVideo {
        path,
        clips: outcomes,
    })
}
