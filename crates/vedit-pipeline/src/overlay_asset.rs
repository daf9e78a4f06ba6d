//! Overlay asset branch: render, normalize, encode.

use std::path::PathBuf;
use std::time::Instant;

use vedit_media::{
    normalize_frames, render_scene, AnimationEncoder, CaptureFailure, CaptureSettings,
    FrameNormalizer, FrameRenderer, MediaError, NormalizeFailure, Workspace,
};
use vedit_models::Stage;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;

/// GIF name inside the workspace.
pub const GIF_ARTIFACT: &str = "animation.gif";
/// Scratch directory for the encoder's contiguous frame sequence.
pub const GIF_STAGING_DIR: &str = "gif-input";

#[derive(Debug, Clone)]
pub struct OverlayAsset {
    /// GIF inside the workspace
    pub gif: PathBuf,
    /// Frame indices handed to the encoder
    pub frames: Vec<u32>,
    pub capture_failures: Vec<CaptureFailure>,
    pub normalize_failures: Vec<NormalizeFailure>,
}

pub async fn build_overlay_asset(
    renderer: &dyn FrameRenderer,
    normalizer: &dyn FrameNormalizer,
    encoder: &dyn AnimationEncoder,
    workspace: &Workspace,
    config: &PipelineConfig,
    logger: &RunLogger,
) -> PipelineResult<OverlayAsset> {
    let logger = logger.child("overlay_asset");
    logger.log_start(&format!(
        "Rendering {} frames at {} fps",
        config.frame_count, config.frame_rate
    ));

    // Render
    let started = Instant::now();
    let settings = CaptureSettings {
        frame_count: config.frame_count,
        frame_rate: config.frame_rate,
        settle: config.settle,
    };
    let render = render_scene(renderer, workspace, &config.scene, &settings)
        .await
        .map_err(|e| match e {
            MediaError::Io(_) => PipelineError::Workspace(e),
            other => PipelineError::Connection(other),
        })?;
    metrics::record_stage_duration(Stage::Render.as_str(), started.elapsed().as_secs_f64());
    metrics::record_capture(render.frames.len(), render.failures.len());

    for failure in &render.failures {
        logger.log_warning(&format!(
            "Frame {} not captured: {}",
            failure.index, failure.error
        ));
    }

    // Normalize
    let started = Instant::now();
    let normalize_failures =
        normalize_frames(normalizer, &render.frames, config.matte_rgb()).await;
    metrics::record_stage_duration(Stage::Normalize.as_str(), started.elapsed().as_secs_f64());
    metrics::record_normalize_failures(normalize_failures.len());

    // Encode
    let started = Instant::now();
    let staging = workspace
        .subdir(GIF_STAGING_DIR)
        .await
        .map_err(PipelineError::Workspace)?;
    let gif = workspace.artifact_path(GIF_ARTIFACT);
    encoder
        .encode(&render.frames, &staging, &config.gif, &gif)
        .await
        .map_err(PipelineError::Encode)?;
    metrics::record_stage_duration(Stage::Encode.as_str(), started.elapsed().as_secs_f64());

    logger.log_completion(&format!(
        "GIF encoded from {} frames ({} capture gaps, {} normalization misses)",
        render.frames.len(),
        render.failures.len(),
        normalize_failures.len()
    ));

    Ok(OverlayAsset {
        gif,
        frames: render.indices(),
        capture_failures: render.failures,
        normalize_failures,
    })
}
