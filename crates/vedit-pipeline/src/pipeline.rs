//! Run orchestration.
//!
//! ```text
//!   render -> normalize -> encode ──┐
//!                                   ├─> overlay -> move outputs
//!   clips (fan-out) -> concat ──────┘
//! ```
//!
//! The workspace brackets the run: it is acquired before any stage writes
//! and released on every exit path, including deadline expiry.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use vedit_media::{
    move_file, select_normalizer, AnimationEncoder, FfmpegGifEncoder, FfmpegVideoFilter,
    FrameNormalizer, FrameRenderer, VideoFilter, Workspace,
};
use vedit_models::{Artifact, Stage};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::overlay_asset::build_overlay_asset;
use crate::report::PipelineReport;
use crate::segments::build_base_video;

/// Composited video name inside the workspace.
pub const FINAL_ARTIFACT: &str = "final.mp4";

pub struct Pipeline {
    config: PipelineConfig,
    renderer: Arc<dyn FrameRenderer>,
    normalizer: Arc<dyn FrameNormalizer>,
    encoder: Arc<dyn AnimationEncoder>,
    filter: Arc<dyn VideoFilter>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        renderer: Arc<dyn FrameRenderer>,
        normalizer: Arc<dyn FrameNormalizer>,
        encoder: Arc<dyn AnimationEncoder>,
        filter: Arc<dyn VideoFilter>,
    ) -> Self {
        Self {
            config,
            renderer,
            normalizer,
            encoder,
            filter,
        }
    }

    /// Wire the production tool implementations.
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let renderer = default_renderer(&config)?;
        let normalizer: Arc<dyn FrameNormalizer> = Arc::from(
            select_normalizer(config.normalizer).map_err(|e| PipelineError::config(e.to_string()))?,
        );
        let encoder = Arc::new(FfmpegGifEncoder::new().with_timeout(config.ffmpeg_timeout_secs));
        let filter = Arc::new(
            FfmpegVideoFilter::new(config.encoding.clone()).with_timeout(config.ffmpeg_timeout_secs),
        );
        Ok(Self::new(config, renderer, normalizer, encoder, filter))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one run.
    pub async fn run(&self) -> PipelineResult<PipelineReport> {
        let run_id = Uuid::new_v4().to_string();
        let logger = RunLogger::new(&run_id, "overlay_pipeline");
        let span = logger.create_span();

        self.run_inner(run_id, logger).instrument(span).await
    }

    async fn run_inner(&self, run_id: String, logger: RunLogger) -> PipelineResult<PipelineReport> {
        let started = Instant::now();

        if let Err(e) = self.config.validate() {
            logger.log_error(&e.to_string());
            metrics::record_run_failed(e.kind());
            return Err(e);
        }

        logger.log_start(&format!(
            "workspace={} clips={} frames={}",
            self.config.work_dir.display(),
            self.config.clips.len(),
            self.config.frame_count
        ));

        let workspace = match Workspace::acquire(&self.config.work_dir).await {
            Ok(workspace) => workspace,
            Err(e) => {
                let e = PipelineError::Workspace(e);
                logger.log_error(&e.to_string());
                metrics::record_run_failed(e.kind());
                return Err(e);
            }
        };

        let outcome = match self.config.deadline {
            Some(deadline) => with_deadline(deadline, self.execute(&workspace, &run_id, &logger)).await,
            None => self.execute(&workspace, &run_id, &logger).await,
        };

        // Cleanup failures never replace the run's own outcome.
        let cleanup_failures = workspace.release().await;
        for failure in &cleanup_failures {
            logger.log_warning(&format!(
                "Could not remove {}: {}",
                failure.path.display(),
                failure.error
            ));
        }
        metrics::record_cleanup_failures(cleanup_failures.len());

        match outcome {
            Ok(mut report) => {
                report.cleanup_failures = cleanup_failures;
                report.elapsed_ms = started.elapsed().as_millis() as u64;
                metrics::record_run_completed(started.elapsed().as_secs_f64());
                logger.log_completion(&format!(
                    "{} frames, {} clips in {} ms",
                    report.frames.len(),
                    report.clips.len(),
                    report.elapsed_ms
                ));
                Ok(report)
            }
            Err(e) => {
                metrics::record_run_failed(e.kind());
                logger.log_error(&e.to_string());
                if let Some(stderr) = e.tool_stderr() {
                    logger.log_error(&format!("Tool output: {stderr}"));
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        workspace: &Workspace,
        run_id: &str,
        logger: &RunLogger,
    ) -> PipelineResult<PipelineReport> {
        let config = &self.config;

        // The first fatal error drops the sibling branch and its processes.
        let (asset, base) = tokio::try_join!(
            build_overlay_asset(
                self.renderer.as_ref(),
                self.normalizer.as_ref(),
                self.encoder.as_ref(),
                workspace,
                config,
                logger,
            ),
            build_base_video(
                self.filter.as_ref(),
                &config.clips,
                workspace,
                config.max_ffmpeg_processes,
                logger,
            )
        )?;

        let started = Instant::now();
        let composited = workspace.artifact_path(FINAL_ARTIFACT);
        logger.log_progress("Compositing overlay onto base video");
        self.filter
            .overlay(&base.path, &asset.gif, &config.overlay, &composited)
            .await
            .map_err(PipelineError::Overlay)?;
        metrics::record_stage_duration(Stage::Overlay.as_str(), started.elapsed().as_secs_f64());

        let mut placements = vec![
            (Stage::Encode, asset.gif.as_path(), config.gif_output.as_path()),
            (Stage::Overlay, composited.as_path(), config.final_output.as_path()),
        ];
        if let Some(concat_output) = &config.concat_output {
            placements.push((Stage::Concat, base.path.as_path(), concat_output.as_path()));
        }
        let outputs = place_outputs(&placements).await?;

        Ok(PipelineReport {
            run_id: run_id.to_string(),
            outputs,
            frames: asset.frames,
            capture_failures: asset.capture_failures,
            normalize_failures: asset.normalize_failures,
            clips: base.clips,
            cleanup_failures: Vec::new(),
            elapsed_ms: 0,
        })
    }
}

async fn with_deadline<F>(deadline: Duration, run: F) -> PipelineResult<PipelineReport>
where
    F: std::future::Future<Output = PipelineResult<PipelineReport>>,
{
    match tokio::time::timeout(deadline, run).await {
        Ok(result) => result,
        Err(_) => Err(PipelineError::DeadlineExceeded(deadline.as_secs_f64())),
    }
}

/// Move finished artifacts out of the workspace.
///
/// All or nothing: if one move fails, outputs already placed are removed
/// so a failed run leaves no partial results behind.
async fn place_outputs(placements: &[(Stage, &Path, &Path)]) -> PipelineResult<Vec<Artifact>> {
    let mut placed: Vec<Artifact> = Vec::with_capacity(placements.len());
    for (stage, from, to) in placements {
        if let Err(e) = move_file(from, to).await {
            for artifact in &placed {
                let _ = tokio::fs::remove_file(artifact.path()).await;
            }
            return Err(PipelineError::Output(e));
        }
        placed.push(Artifact::new(*stage, *to));
    }
    Ok(placed)
}

#[cfg(feature = "chromium")]
fn default_renderer(config: &PipelineConfig) -> PipelineResult<Arc<dyn FrameRenderer>> {
    Ok(Arc::new(
        vedit_media::ChromiumRenderer::new().with_executable(config.chrome_path.clone()),
    ))
}

#[cfg(not(feature = "chromium"))]
fn default_renderer(_config: &PipelineConfig) -> PipelineResult<Arc<dyn FrameRenderer>> {
    Err(PipelineError::config(
        "No rendering surface available: built without the `chromium` feature",
    ))
}
