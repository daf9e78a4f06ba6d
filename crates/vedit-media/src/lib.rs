//! External tool layer for the overlay pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a runner with progress parsing
//! - Capability traits for rendering, normalization, encoding and filtering
//! - Production implementations (headless Chromium, ImageMagick or built-in
//!   normalizer, ffmpeg GIF encoder, ffmpeg video filter)
//! - The per-run workspace with guaranteed cleanup

pub mod capability;
pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod gif;
pub mod normalize;
pub mod overlay;
pub mod probe;
pub mod progress;
pub mod render;
pub mod segment;
pub mod video_filter;
pub mod workspace;

pub use capability::{AnimationEncoder, FrameNormalizer, FrameRenderer, RenderSurface, VideoFilter};
pub use command::{check_ffmpeg, check_ffprobe, check_imagemagick, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::move_file;
pub use gif::FfmpegGifEncoder;
pub use normalize::{
    normalize_frames, select_normalizer, BuiltinNormalizer, MagickNormalizer, NormalizeFailure,
    NormalizerKind,
};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use render::{render_scene, CaptureFailure, CaptureSettings, RenderReport};
#[cfg(feature = "chromium")]
pub use render::ChromiumRenderer;
pub use video_filter::FfmpegVideoFilter;
pub use workspace::{CleanupFailure, Workspace};
