//! Animated GIF assembly.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use vedit_models::{Frame, GifSettings};

use crate::capability::AnimationEncoder;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::filter_gif_palette;
use crate::fs_utils::link_or_copy;

/// Prefix of the contiguous sequence handed to the image2 demuxer.
const STAGED_PREFIX: &str = "enc-";
const STAGED_DIGITS: usize = 5;

/// Encodes PNG frames into a GIF with ffmpeg's palettegen/paletteuse.
///
/// Frames are first staged as a gap-free `enc-00000.png` sequence, so a
/// capture with missing indices still yields one GIF frame per frame given.
#[derive(Debug, Clone, Default)]
pub struct FfmpegGifEncoder {
    runner: FfmpegRunner,
}

impl FfmpegGifEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.runner = self.runner.with_optional_timeout(secs);
        self
    }
}

/// Staged file name for sequence position `seq`.
fn staged_filename(seq: usize) -> String {
    format!("{}{:0width$}.png", STAGED_PREFIX, seq, width = STAGED_DIGITS)
}

/// Link `frames` into `staging_dir` as a contiguous sequence, ordered by index.
///
/// Returns the number of staged files.
pub async fn stage_frames(frames: &[Frame], staging_dir: &Path) -> MediaResult<usize> {
    let mut ordered: Vec<&Frame> = frames.iter().collect();
    ordered.sort_by_key(|f| f.index);

    tokio::fs::create_dir_all(staging_dir).await?;
    for (seq, frame) in ordered.iter().enumerate() {
        if !frame.path.exists() {
            return Err(MediaError::FileNotFound(frame.path.clone()));
        }
        link_or_copy(&frame.path, staging_dir.join(staged_filename(seq))).await?;
    }
    Ok(ordered.len())
}

/// Build the encode command for a staged sequence.
pub fn build_gif_command(staging_dir: &Path, settings: &GifSettings, output: &Path) -> FfmpegCommand {
    let pattern = staging_dir.join(format!("{}%0{}d.png", STAGED_PREFIX, STAGED_DIGITS));
    let loop_flag = if settings.loop_forever { "0" } else { "-1" };

    FfmpegCommand::new(pattern, output)
        .input_args(["-framerate".to_string(), settings.frame_rate.to_string()])
        .video_filter(filter_gif_palette(settings))
        .output_args(["-loop", loop_flag])
}

#[async_trait]
impl AnimationEncoder for FfmpegGifEncoder {
    fn name(&self) -> &'static str {
        "ffmpeg-gif"
    }

    async fn encode(
        &self,
        frames: &[Frame],
        staging_dir: &Path,
        settings: &GifSettings,
        output: &Path,
    ) -> MediaResult<()> {
        if frames.is_empty() {
            return Err(MediaError::invalid_input("No frames to encode"));
        }
        if settings.frame_rate == 0 {
            return Err(MediaError::invalid_input("GIF frame rate must be non-zero"));
        }

        let staged = stage_frames(frames, staging_dir).await?;
        info!(
            frames = staged,
            frame_rate = settings.frame_rate,
            output = %output.display(),
            "Encoding animated GIF"
        );

        let cmd = build_gif_command(staging_dir, settings, output);
        self.runner.run(&cmd).await?;

        info!(output = %output.display(), "GIF encoded");
        Ok(())
    }
}
