//! Pipeline configuration.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use vedit_media::NormalizerKind;
use vedit_models::encoding::parse_hex_color;
use vedit_models::{Clip, ClipEffect, Corner, EncodingConfig, GifSettings, OverlayPosition, Scene};

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Workspace directory for transient artifacts
    pub work_dir: PathBuf,
    /// Default source for clips that do not name one
    pub source_video: PathBuf,
    pub scene: Scene,
    /// Clips in concatenation order
    pub clips: Vec<Clip>,
    pub gif_output: PathBuf,
    /// Keep the concatenated base video here when set
    pub concat_output: Option<PathBuf>,
    pub final_output: PathBuf,
    pub frame_count: u32,
    pub frame_rate: u32,
    /// Warm-up between page load and the first capture
    pub settle: Duration,
    /// Maximum concurrent clip jobs
    pub max_ffmpeg_processes: usize,
    /// End-to-end deadline for the whole run
    pub deadline: Option<Duration>,
    /// Per-invocation ffmpeg timeout in seconds
    pub ffmpeg_timeout_secs: Option<u64>,
    pub normalizer: NormalizerKind,
    pub overlay: OverlayPosition,
    pub gif: GifSettings,
    pub encoding: EncodingConfig,
    /// Browser executable override
    pub chrome_path: Option<PathBuf>,
}

/// Clips `[(0, 5, fadeOut), (5, 5, fadeIn)]` over `source`.
pub fn default_clips(source: &Path) -> Vec<Clip> {
    vec![
        Clip::new("first", source, 0.0, 5.0, ClipEffect::FadeOut),
        Clip::new("second", source, 5.0, 5.0, ClipEffect::FadeIn),
    ]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let source_video = PathBuf::from("forest.mp4");
        Self {
            work_dir: PathBuf::from("frames"),
            clips: default_clips(&source_video),
            source_video,
            scene: Scene::default(),
            gif_output: PathBuf::from("animation.gif"),
            concat_output: None,
            final_output: PathBuf::from("final_with_gif.mp4"),
            frame_count: 60,
            frame_rate: 20,
            settle: Duration::from_millis(1000),
            max_ffmpeg_processes: 4,
            deadline: None,
            ffmpeg_timeout_secs: None,
            normalizer: NormalizerKind::Auto,
            overlay: OverlayPosition::default(),
            gif: GifSettings::default(),
            encoding: EncodingConfig::default(),
            chrome_path: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

impl PipelineConfig {
    /// Create config from `VEDIT_*` environment variables.
    ///
    /// Fails when a referenced scene/clip file cannot be read or parsed,
    /// or when an enumerated value is not recognized.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();

        let source_video = env_path("VEDIT_SOURCE_VIDEO").unwrap_or(defaults.source_video);

        let scene = match env_path("VEDIT_SCENE_FILE") {
            Some(path) => load_scene(&path)?,
            None => defaults.scene,
        };

        let clips = match env_path("VEDIT_CLIPS_FILE") {
            Some(path) => load_clips(&path, &source_video)?,
            None => default_clips(&source_video),
        };

        let normalizer = match std::env::var("VEDIT_NORMALIZER") {
            Ok(value) => value
                .parse::<NormalizerKind>()
                .map_err(|e| PipelineError::config(e.to_string()))?,
            Err(_) => defaults.normalizer,
        };

        let corner = match std::env::var("VEDIT_OVERLAY_CORNER") {
            Ok(value) => value
                .parse::<Corner>()
                .map_err(|e| PipelineError::config(e.to_string()))?,
            Err(_) => defaults.overlay.corner,
        };

        let frame_rate = env_parse("VEDIT_FRAME_RATE").unwrap_or(defaults.frame_rate);

        let mut gif = defaults.gif.with_frame_rate(frame_rate);
        if let Ok(matte) = std::env::var("VEDIT_MATTE_COLOR") {
            gif.matte_color = matte.trim().trim_start_matches('#').to_string();
        }
        if let Some(threshold) = env_parse("VEDIT_ALPHA_THRESHOLD") {
            gif.alpha_threshold = threshold;
        }

        let mut encoding = defaults.encoding;
        if let Some(crf) = env_parse("VEDIT_CRF") {
            encoding = encoding.with_crf(crf);
        }
        if let Ok(preset) = std::env::var("VEDIT_PRESET") {
            encoding = encoding.with_preset(preset);
        }

        Ok(Self {
            work_dir: env_path("VEDIT_WORK_DIR").unwrap_or(defaults.work_dir),
            source_video,
            scene,
            clips,
            gif_output: env_path("VEDIT_GIF_OUTPUT").unwrap_or(defaults.gif_output),
            concat_output: env_path("VEDIT_CONCAT_OUTPUT"),
            final_output: env_path("VEDIT_FINAL_OUTPUT").unwrap_or(defaults.final_output),
            frame_count: env_parse("VEDIT_FRAME_COUNT").unwrap_or(defaults.frame_count),
            frame_rate,
            settle: env_parse("VEDIT_SETTLE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle),
            max_ffmpeg_processes: env_parse("VEDIT_MAX_FFMPEG")
                .unwrap_or(defaults.max_ffmpeg_processes),
            deadline: env_parse("VEDIT_DEADLINE_SECS").map(Duration::from_secs),
            ffmpeg_timeout_secs: env_parse("VEDIT_FFMPEG_TIMEOUT_SECS"),
            normalizer,
            overlay: OverlayPosition::new(
                corner,
                env_parse("VEDIT_OVERLAY_MARGIN").unwrap_or(defaults.overlay.margin),
            ),
            gif,
            encoding,
            chrome_path: env_path("VEDIT_CHROME_PATH"),
        })
    }

    /// Reject configurations that cannot produce a run.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.frame_count == 0 {
            return Err(PipelineError::config("Frame count must be greater than zero"));
        }
        if self.frame_rate == 0 {
            return Err(PipelineError::config("Frame rate must be greater than zero"));
        }
        if self.gif.frame_rate == 0 {
            return Err(PipelineError::config("GIF frame rate must be greater than zero"));
        }
        if self.max_ffmpeg_processes == 0 {
            return Err(PipelineError::config("VEDIT_MAX_FFMPEG must be at least 1"));
        }
        if self.clips.is_empty() {
            return Err(PipelineError::config("Clip list is empty"));
        }
        if self.gif.matte_rgb().is_none() {
            return Err(PipelineError::config(format!(
                "Matte color '{}' is not a rrggbb hex color",
                self.gif.matte_color
            )));
        }
        self.check_outputs_outside_workspace()?;
        self.scene.validate().map_err(PipelineError::Config)?;
        for clip in &self.clips {
            clip.validate().map_err(PipelineError::Config)?;
        }
        Ok(())
    }

    /// Final outputs must survive workspace teardown, so none may sit
    /// inside `work_dir`, and `work_dir` may not contain them.
    fn check_outputs_outside_workspace(&self) -> PipelineResult<()> {
        let work_dir = normalize_path(&self.work_dir)?;
        let outputs = [
            ("gif output", Some(&self.gif_output)),
            ("final output", Some(&self.final_output)),
            ("concat output", self.concat_output.as_ref()),
        ];
        for (label, path) in outputs {
            let Some(path) = path else { continue };
            if normalize_path(path)?.starts_with(&work_dir) {
                return Err(PipelineError::config(format!(
                    "The {} {} is inside the workspace {}, which is removed after every run",
                    label,
                    path.display(),
                    self.work_dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Matte color as RGB. Call after [`validate`](Self::validate).
    pub fn matte_rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.gif.matte_color).unwrap_or([255, 255, 255])
    }
}

/// Absolute form of `path` with `.` and `..` folded, without touching
/// the filesystem. Neither path needs to exist yet.
fn normalize_path(path: &Path) -> PipelineResult<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| PipelineError::config(format!("Cannot resolve {}: {}", path.display(), e)))?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

fn load_scene(path: &Path) -> PipelineResult<Scene> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::config(format!("Cannot read scene file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        PipelineError::config(format!("Invalid scene file {}: {}", path.display(), e))
    })
}

/// Load a JSON clip list; clips without a `source` use `default_source`.
fn load_clips(path: &Path, default_source: &Path) -> PipelineResult<Vec<Clip>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::config(format!("Cannot read clips file {}: {}", path.display(), e))
    })?;
    parse_clips(&raw, default_source)
        .map_err(|e| PipelineError::config(format!("Invalid clips file {}: {}", path.display(), e)))
}

fn parse_clips(raw: &str, default_source: &Path) -> Result<Vec<Clip>, serde_json::Error> {
    let mut clips: Vec<Clip> = serde_json::from_str(raw)?;
    for clip in &mut clips {
        if clip.source.as_os_str().is_empty() {
            clip.source = default_source.to_path_buf();
        }
    }
    Ok(clips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clips.len(), 2);
        assert_eq!(config.clips[0].effect, ClipEffect::FadeOut);
        assert_eq!(config.clips[1].start, 5.0);
        assert_eq!(config.matte_rgb(), [255, 255, 255]);
    }

    #[test]
    fn test_validate_rejects_zero_frames_and_empty_clips() {
        let config = PipelineConfig {
            frame_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let config = PipelineConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let config = PipelineConfig {
            clips: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_matte() {
        let mut config = PipelineConfig::default();
        config.gif.matte_color = "white".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_outputs_inside_workspace() {
        let config = PipelineConfig {
            work_dir: PathBuf::from("/tmp/run/frames"),
            gif_output: PathBuf::from("/tmp/run/frames/animation.gif"),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        // A workspace that contains the outputs, e.g. the current directory
        let config = PipelineConfig {
            work_dir: PathBuf::from("."),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let config = PipelineConfig {
            work_dir: PathBuf::from("/tmp/run/frames"),
            concat_output: Some(PathBuf::from("/tmp/run/out/../frames/concat.mp4")),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_validate_accepts_sibling_outputs() {
        let config = PipelineConfig {
            work_dir: PathBuf::from("/tmp/run/frames"),
            gif_output: PathBuf::from("/tmp/run/frames-out/animation.gif"),
            final_output: PathBuf::from("/tmp/run/final.mp4"),
            concat_output: Some(PathBuf::from("/tmp/run/./frames/../concat.mp4")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalize_path_folds_dots() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c")).unwrap(),
            PathBuf::from("/a/c")
        );
        let relative = normalize_path(Path::new("frames")).unwrap();
        assert!(relative.is_absolute());
        assert!(relative.ends_with("frames"));
    }

    #[test]
    fn test_parse_clips_fills_default_source() {
        let clips = parse_clips(
            r#"[
                {"name": "a", "start": "0:00", "duration": 2.5, "effect": "blur"},
                {"name": "b", "source": "other.mp4", "start": 3, "duration": "00:00:02"}
            ]"#,
            Path::new("forest.mp4"),
        )
        .unwrap();

        assert_eq!(clips[0].source, PathBuf::from("forest.mp4"));
        assert_eq!(clips[0].effect, ClipEffect::Blur);
        assert_eq!(clips[1].source, PathBuf::from("other.mp4"));
        assert_eq!(clips[1].duration, 2.0);
        assert_eq!(clips[1].effect, ClipEffect::None);
    }
}
