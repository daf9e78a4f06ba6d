//! Capability traits for the external tools.
//!
//! Each trait has one production implementation in this crate; the
//! orchestrator depends only on the traits, so tests swap in fakes.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use vedit_models::{Clip, Frame, GifSettings, OverlayPosition, Scene};

use crate::error::MediaResult;

/// Launches a rendering surface with a loaded document.
#[async_trait]
pub trait FrameRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Launch or connect, navigate to `document` and wait for it to load.
    ///
    /// Any error here means the rendering surface is unavailable.
    async fn open(&self, document: &Path, scene: &Scene) -> MediaResult<Box<dyn RenderSurface>>;
}

/// A live page that can be scripted and captured.
#[async_trait]
pub trait RenderSurface: Send {
    /// Evaluate a script in the page.
    async fn evaluate(&mut self, script: &str) -> MediaResult<()>;

    /// Capture the current frame as PNG bytes with alpha.
    ///
    /// An empty buffer means the capture produced no data.
    async fn capture(&mut self) -> MediaResult<Vec<u8>>;

    /// Shut the surface down.
    async fn close(&mut self) -> MediaResult<()>;
}

/// Keys a matte color to transparent in a frame file, in place.
///
/// Must be idempotent: normalizing an already normalized frame leaves the
/// file byte-identical.
#[async_trait]
pub trait FrameNormalizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn normalize(&self, frame: &Path, matte: [u8; 3]) -> MediaResult<()>;
}

/// Assembles ordered frames into one looping animated image.
#[async_trait]
pub trait AnimationEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Encode `frames` (ordered by index, gaps allowed) to `output`.
    ///
    /// `staging_dir` is a scratch directory inside the workspace.
    async fn encode(
        &self,
        frames: &[Frame],
        staging_dir: &Path,
        settings: &GifSettings,
        output: &Path,
    ) -> MediaResult<()>;
}

/// Video filtering and muxing operations.
#[async_trait]
pub trait VideoFilter: Send + Sync {
    /// Extract `clip` from its source and apply its effect.
    async fn extract_clip(&self, clip: &Clip, output: &Path) -> MediaResult<()>;

    /// Join `inputs` in order by stream copy, using `list_file` as the
    /// concat demuxer list.
    async fn concat(&self, inputs: &[PathBuf], list_file: &Path, output: &Path) -> MediaResult<()>;

    /// Composite a looping `animation` over `base`, keeping the base audio.
    async fn overlay(
        &self,
        base: &Path,
        animation: &Path,
        position: &OverlayPosition,
        output: &Path,
    ) -> MediaResult<()>;
}
