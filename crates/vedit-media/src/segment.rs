//! Subclip extraction with optional fade or blur.

use std::path::Path;
use tracing::info;

use vedit_models::{Clip, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::filter_clip_effect;

/// Build the ffmpeg command for one clip.
///
/// `ClipEffect::None` stream-copies the range; every other effect
/// re-encodes video with `encoding` and copies audio.
pub fn build_clip_command(clip: &Clip, output: &Path, encoding: &EncodingConfig) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(&clip.source, output)
        .seek(clip.start)
        .duration(clip.duration);

    match filter_clip_effect(clip) {
        None => cmd.codec_copy().output_args(["-avoid_negative_ts", "make_zero"]),
        Some(filter) => cmd
            .video_filter(filter)
            .output_args(encoding.to_ffmpeg_args())
            .audio_codec("copy"),
    }
}

/// Extract `clip` into `output`.
pub async fn extract_clip(
    runner: &FfmpegRunner,
    clip: &Clip,
    output: &Path,
    encoding: &EncodingConfig,
) -> MediaResult<()> {
    clip.validate().map_err(MediaError::invalid_input)?;
    if !clip.source.exists() {
        return Err(MediaError::FileNotFound(clip.source.clone()));
    }

    info!(
        clip = %clip.name,
        source = %clip.source.display(),
        start = clip.start,
        duration = clip.duration,
        effect = %clip.effect,
        "Extracting clip"
    );

    let cmd = build_clip_command(clip, output, encoding);
    runner.run(&cmd).await?;

    info!(clip = %clip.name, output = %output.display(), "Clip extracted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vedit_models::ClipEffect;

    #[test]
    fn test_plain_clip_is_stream_copy() {
        let clip = Clip::new("intro", "forest.mp4", 0.0, 5.0, ClipEffect::None);
        let args = build_clip_command(&clip, Path::new("clip.mp4"), &EncodingConfig::default())
            .build_args();

        assert!(args.windows(2).any(|w| w[0] == "-ss" && w[1] == "0.000"));
        assert!(args.windows(2).any(|w| w[0] == "-t" && w[1] == "5.000"));
        assert!(args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy"));
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[test]
    fn test_fade_clip_reencodes_video_and_copies_audio() {
        let clip = Clip::new("outro", "forest.mp4", 5.0, 5.0, ClipEffect::FadeIn);
        let args = build_clip_command(&clip, Path::new("clip.mp4"), &EncodingConfig::default())
            .build_args();

        assert!(args.windows(2).any(|w| w[0] == "-vf" && w[1] == "fade=t=in:st=0:d=1"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "copy"));
    }

    #[tokio::test]
    async fn test_missing_source_is_rejected_before_ffmpeg() {
        let clip = Clip::new("x", "/nonexistent/source.mp4", 0.0, 1.0, ClipEffect::None);
        let result = extract_clip(
            &FfmpegRunner::new(),
            &clip,
            Path::new("/tmp/out.mp4"),
            &EncodingConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
