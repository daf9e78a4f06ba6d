//! ffmpeg-backed [`VideoFilter`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use vedit_models::{Clip, EncodingConfig, OverlayPosition};

use crate::capability::VideoFilter;
use crate::command::FfmpegRunner;
use crate::concat::concat_videos;
use crate::error::MediaResult;
use crate::overlay::overlay_animation;
use crate::segment::extract_clip;

#[derive(Debug, Clone, Default)]
pub struct FfmpegVideoFilter {
    runner: FfmpegRunner,
    encoding: EncodingConfig,
}

impl FfmpegVideoFilter {
    pub fn new(encoding: EncodingConfig) -> Self {
        Self {
            runner: FfmpegRunner::new(),
            encoding,
        }
    }

    /// Per-invocation timeout for every ffmpeg run.
    pub fn with_timeout(mut self, secs: Option<u64>) -> Self {
        self.runner = self.runner.with_optional_timeout(secs);
        self
    }
}

#[async_trait]
impl VideoFilter for FfmpegVideoFilter {
    async fn extract_clip(&self, clip: &Clip, output: &Path) -> MediaResult<()> {
        extract_clip(&self.runner, clip, output, &self.encoding).await
    }

    async fn concat(&self, inputs: &[PathBuf], list_file: &Path, output: &Path) -> MediaResult<()> {
        concat_videos(&self.runner, inputs, list_file, output).await
    }

    async fn overlay(
        &self,
        base: &Path,
        animation: &Path,
        position: &OverlayPosition,
        output: &Path,
    ) -> MediaResult<()> {
        overlay_animation(&self.runner, base, animation, position, &self.encoding, output).await
    }
}
