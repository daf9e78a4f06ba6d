//! Animated overlay compositing.
//!
//! The animation is looped for the full length of the base video
//! (`-ignore_loop 0` plus `shortest=1`) and the base audio is copied
//! through untouched.

use std::path::Path;
use tracing::{debug, info, warn};

use vedit_models::{EncodingConfig, OverlayPosition};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{filter_overlay, OVERLAY_OUTPUT_LABEL};
use crate::probe::probe_video;

/// Build the overlay command.
pub fn build_overlay_command(
    base: &Path,
    animation: &Path,
    position: &OverlayPosition,
    encoding: &EncodingConfig,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(base, output)
        .add_input(animation)
        .input_args(["-ignore_loop", "0"])
        .filter_complex(filter_overlay(position))
        .map(OVERLAY_OUTPUT_LABEL)
        .map("0:a?")
        .output_args(encoding.to_ffmpeg_args())
        .audio_codec("copy")
        .output_args(["-movflags", "+faststart"])
}

/// Composite `animation` over `base` into `output`.
pub async fn overlay_animation(
    runner: &FfmpegRunner,
    base: &Path,
    animation: &Path,
    position: &OverlayPosition,
    encoding: &EncodingConfig,
    output: &Path,
) -> MediaResult<()> {
    for input in [base, animation] {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
    }

    // Probe only feeds progress reporting; a failure is not fatal here.
    let total_ms = match probe_video(base).await {
        Ok(info) => info.duration_ms(),
        Err(e) => {
            warn!(base = %base.display(), error = %e, "Could not probe base video");
            0
        }
    };

    info!(
        base = %base.display(),
        animation = %animation.display(),
        corner = %position.corner,
        margin = position.margin,
        "Applying animated overlay"
    );

    let cmd = build_overlay_command(base, animation, position, encoding, output);
    runner
        .run_with_progress(&cmd, move |progress| {
            debug!(
                percent = progress.percentage(total_ms),
                speed = progress.speed,
                eta_secs = ?progress.eta_seconds(total_ms),
                "Overlay progress"
            );
        })
        .await?;

    info!(output = %output.display(), "Overlay applied");
    Ok(())
}
