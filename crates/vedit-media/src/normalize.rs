//! Transparency normalization: key a matte color to fully transparent.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;
use tracing::{debug, warn};

use vedit_models::Frame;

use crate::capability::FrameNormalizer;
use crate::command::check_imagemagick;
use crate::error::{MediaError, MediaResult};

/// Which normalizer implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizerKind {
    /// ImageMagick when installed, built-in otherwise.
    #[default]
    Auto,
    Magick,
    Builtin,
}

impl FromStr for NormalizerKind {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "magick" | "imagemagick" => Ok(Self::Magick),
            "builtin" => Ok(Self::Builtin),
            other => Err(MediaError::invalid_input(format!("Unknown normalizer: {other}"))),
        }
    }
}

/// Resolve a normalizer implementation.
pub fn select_normalizer(kind: NormalizerKind) -> MediaResult<Box<dyn FrameNormalizer>> {
    match kind {
        NormalizerKind::Builtin => Ok(Box::new(BuiltinNormalizer)),
        NormalizerKind::Magick => Ok(Box::new(MagickNormalizer::new(check_imagemagick()?))),
        NormalizerKind::Auto => match check_imagemagick() {
            Ok(program) => Ok(Box::new(MagickNormalizer::new(program))),
            Err(_) => {
                debug!("ImageMagick not found, using built-in normalizer");
                Ok(Box::new(BuiltinNormalizer))
            }
        },
    }
}

/// A frame the normalizer could not process; it is encoded as captured.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NormalizeFailure {
    pub index: u32,
    pub error: String,
}

/// Normalize every frame in order. Failures are collected, never raised.
pub async fn normalize_frames(
    normalizer: &dyn FrameNormalizer,
    frames: &[Frame],
    matte: [u8; 3],
) -> Vec<NormalizeFailure> {
    let mut failures = Vec::new();
    for frame in frames {
        if let Err(e) = normalizer.normalize(&frame.path, matte).await {
            warn!(
                frame = frame.index,
                normalizer = normalizer.name(),
                error = %e,
                "Frame normalization failed, keeping frame as captured"
            );
            failures.push(NormalizeFailure {
                index: frame.index,
                error: e.to_string(),
            });
        }
    }
    failures
}

fn hex_color(matte: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", matte[0], matte[1], matte[2])
}

/// `magick <img> -transparent <matte> <img>`.
#[derive(Debug, Clone)]
pub struct MagickNormalizer {
    program: PathBuf,
}

impl MagickNormalizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn build_args(frame: &Path, matte: [u8; 3]) -> Vec<String> {
        let path = frame.to_string_lossy().to_string();
        vec![
            path.clone(),
            "-transparent".to_string(),
            hex_color(matte),
            // Timestamp chunks would make repeated runs differ byte-wise.
            "-define".to_string(),
            "png:exclude-chunks=date,time".to_string(),
            path,
        ]
    }
}

#[async_trait]
impl FrameNormalizer for MagickNormalizer {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    async fn normalize(&self, frame: &Path, matte: [u8; 3]) -> MediaResult<()> {
        if !frame.exists() {
            return Err(MediaError::FileNotFound(frame.to_path_buf()));
        }

        let output = Command::new(&self.program)
            .args(Self::build_args(frame, matte))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ImageMagickFailed {
                message: format!("Failed to normalize {}", frame.display()),
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            });
        }
        Ok(())
    }
}

/// Pure-Rust normalizer using the `image` crate.
///
/// Pixels whose RGB equals the matte get alpha 0. The file is only
/// rewritten when a pixel changed, so a second pass is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinNormalizer;

/// Clear alpha on matte pixels in place. Returns the number changed.
pub fn key_matte(image: &mut image::RgbaImage, matte: [u8; 3]) -> usize {
    let mut changed = 0;
    for pixel in image.pixels_mut() {
        if pixel[3] != 0 && pixel[0] == matte[0] && pixel[1] == matte[1] && pixel[2] == matte[2] {
            pixel[3] = 0;
            changed += 1;
        }
    }
    changed
}

#[async_trait]
impl FrameNormalizer for BuiltinNormalizer {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn normalize(&self, frame: &Path, matte: [u8; 3]) -> MediaResult<()> {
        let path = frame.to_path_buf();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path));
        }

        tokio::task::spawn_blocking(move || -> MediaResult<()> {
            let mut image = image::open(&path)?.to_rgba8();
            let changed = key_matte(&mut image, matte);
            if changed > 0 {
                image.save_with_format(&path, image::ImageFormat::Png)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| MediaError::internal(format!("Normalizer task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_test_frame(path: &Path) {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 1, Rgba([244, 63, 94, 255]));
        img.put_pixel(2, 2, Rgba([244, 63, 94, 128]));
        img.save_with_format(path, image::ImageFormat::Png).unwrap();
    }

    #[test]
    fn test_key_matte_only_touches_matte_pixels() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        assert_eq!(key_matte(&mut img, [255, 255, 255]), 1);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(1, 0)[3], 255);
        assert_eq!(key_matte(&mut img, [255, 255, 255]), 0);
    }

    #[tokio::test]
    async fn test_builtin_normalizer_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame-000.png");
        write_test_frame(&path);

        BuiltinNormalizer.normalize(&path, [255, 255, 255]).await.unwrap();
        let once = std::fs::read(&path).unwrap();
        BuiltinNormalizer.normalize(&path, [255, 255, 255]).await.unwrap();
        let twice = std::fs::read(&path).unwrap();
        assert_eq!(once, twice);

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(1, 1)[3], 255);
        assert_eq!(img.get_pixel(2, 2)[3], 128);
    }

    #[tokio::test]
    async fn test_normalize_frames_collects_failures() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("frame-000.png");
        write_test_frame(&good);
        let bad = dir.path().join("frame-001.png");
        std::fs::write(&bad, b"not a png").unwrap();

        let frames = vec![Frame::new(0, 20, &good), Frame::new(1, 20, &bad)];
        let failures = normalize_frames(&BuiltinNormalizer, &frames, [255, 255, 255]).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(std::fs::read(&bad).unwrap(), b"not a png");
    }

    #[tokio::test]
    #[ignore = "requires ImageMagick"]
    async fn test_magick_normalizer_is_idempotent() {
        let normalizer = MagickNormalizer::new(check_imagemagick().unwrap());
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame-000.png");
        write_test_frame(&path);

        normalizer.normalize(&path, [255, 255, 255]).await.unwrap();
        let once = std::fs::read(&path).unwrap();
        normalizer.normalize(&path, [255, 255, 255]).await.unwrap();
        let twice = std::fs::read(&path).unwrap();
        assert_eq!(once, twice);

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(1, 1)[3], 255);
    }

    #[test]
    fn test_magick_args() {
        let args = MagickNormalizer::build_args(Path::new("f.png"), [255, 255, 255]);
        assert_eq!(args.first().unwrap(), "f.png");
        assert_eq!(args.last().unwrap(), "f.png");
        assert!(args.windows(2).any(|w| w[0] == "-transparent" && w[1] == "#ffffff"));
    }

    #[test]
    fn test_normalizer_kind_parse() {
        assert_eq!("AUTO".parse::<NormalizerKind>().unwrap(), NormalizerKind::Auto);
        assert_eq!("imagemagick".parse::<NormalizerKind>().unwrap(), NormalizerKind::Magick);
        assert!("gimp".parse::<NormalizerKind>().is_err());
    }
}
