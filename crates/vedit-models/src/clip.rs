//! Clip descriptors for the segment path.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::timestamp::deserialize_seconds;

/// Fade length applied by [`ClipEffect::FadeIn`] and [`ClipEffect::FadeOut`].
pub const FADE_DURATION_SECS: f64 = 1.0;

/// Effect applied to a clip after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClipEffect {
    /// Lossless range extraction
    #[default]
    None,
    /// Linear fade from black at the start of the clip
    FadeIn,
    /// Linear fade to black at the end of the clip
    FadeOut,
    /// Box blur over the whole clip
    Blur,
}

impl ClipEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipEffect::None => "none",
            ClipEffect::FadeIn => "fadeIn",
            ClipEffect::FadeOut => "fadeOut",
            ClipEffect::Blur => "blur",
        }
    }
}

impl fmt::Display for ClipEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipEffect {
    type Err = ClipEffectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(ClipEffect::None),
            "fadein" | "fade_in" => Ok(ClipEffect::FadeIn),
            "fadeout" | "fade_out" => Ok(ClipEffect::FadeOut),
            "blur" => Ok(ClipEffect::Blur),
            _ => Err(ClipEffectParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown clip effect: {0}")]
pub struct ClipEffectParseError(String);

/// Time-bounded segment of a source video.
///
/// Each clip produces exactly one output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    /// Name used for the output file and in logs
    pub name: String,
    /// Source video; empty means "use the configured default source"
    #[serde(default)]
    pub source: PathBuf,
    /// Start offset in seconds
    #[serde(deserialize_with = "deserialize_seconds")]
    #[schemars(with = "f64")]
    pub start: f64,
    /// Duration in seconds
    #[serde(deserialize_with = "deserialize_seconds")]
    #[schemars(with = "f64")]
    pub duration: f64,
    /// Effect applied after extraction
    #[serde(default)]
    pub effect: ClipEffect,
}

impl Clip {
    /// Create a new clip.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        start: f64,
        duration: f64,
        effect: ClipEffect,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            start,
            duration,
            effect,
        }
    }

    /// End offset in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Output file name for this clip at list position `index`.
    ///
    /// The index prefix keeps names distinct even when clip names repeat.
    pub fn output_filename(&self, index: usize) -> String {
        let name: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("clip-{:02}-{}.mp4", index, name)
    }

    /// Validate the clip.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Clip name must be specified".to_string());
        }

        if !self.start.is_finite() || self.start < 0.0 {
            return Err(format!("Clip '{}' has an invalid start offset", self.name));
        }

        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(format!("Clip '{}' must have a positive duration", self.name));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_parse() {
        assert_eq!("fadeIn".parse::<ClipEffect>().unwrap(), ClipEffect::FadeIn);
        assert_eq!("fade_out".parse::<ClipEffect>().unwrap(), ClipEffect::FadeOut);
        assert_eq!("none".parse::<ClipEffect>().unwrap(), ClipEffect::None);
        assert!("sparkle".parse::<ClipEffect>().is_err());
    }

    #[test]
    fn test_clip_from_json_with_clock_strings() {
        let clip: Clip = serde_json::from_str(
            r#"{"name": "second", "source": "forest.mp4", "start": "00:00:05", "duration": 5, "effect": "fadeIn"}"#,
        )
        .unwrap();
        assert_eq!(clip.start, 5.0);
        assert_eq!(clip.duration, 5.0);
        assert_eq!(clip.effect, ClipEffect::FadeIn);
        assert_eq!(clip.end(), 10.0);
    }

    #[test]
    fn test_output_filename_is_sanitized() {
        let clip = Clip::new("cut first/part", "a.mp4", 0.0, 5.0, ClipEffect::None);
        assert_eq!(clip.output_filename(3), "clip-03-cut_first_part.mp4");
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let clip = Clip::new("x", "a.mp4", 0.0, 0.0, ClipEffect::None);
        assert!(clip.validate().is_err());
    }
}
