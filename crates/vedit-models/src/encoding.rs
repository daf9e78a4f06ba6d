//! Encoding configuration for the overlay GIF and re-encoded video.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default pixel format for re-encoded video
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Matte color keyed to transparent (hex, no leading `#`)
pub const DEFAULT_MATTE_COLOR: &str = "ffffff";
/// Alpha below this becomes fully transparent in the GIF palette
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;

/// Video encoding configuration for stages that must re-encode
/// (fades, blur, overlay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Output pixel format
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            preset: default_preset(),
            crf: DEFAULT_CRF,
            pixel_format: default_pixel_format(),
        }
    }
}

impl EncodingConfig {
    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Returns a new config with updated preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Output arguments for ffmpeg.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ]
    }
}

/// Settings for assembling the animated GIF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GifSettings {
    /// Playback frame rate
    pub frame_rate: u32,
    /// Matte color reserved as the transparency key (hex, no `#`)
    pub matte_color: String,
    /// Alpha threshold for binary transparency
    pub alpha_threshold: u8,
    /// Loop forever (`-loop 0`); otherwise play once
    pub loop_forever: bool,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            frame_rate: 20,
            matte_color: DEFAULT_MATTE_COLOR.to_string(),
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            loop_forever: true,
        }
    }
}

impl GifSettings {
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Matte color as RGB bytes, if `matte_color` is valid hex.
    pub fn matte_rgb(&self) -> Option<[u8; 3]> {
        parse_hex_color(&self.matte_color)
    }
}

/// Parse `rrggbb` (with or without a leading `#`) into RGB bytes.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_args() {
        let args = EncodingConfig::default().with_crf(23).to_ffmpeg_args();
        assert_eq!(args[0], "-c:v");
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"23".to_string()));
        assert!(args.contains(&"yuv420p".to_string()));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("ffffff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#f43f5e"), Some([0xf4, 0x3f, 0x5e]));
        assert_eq!(parse_hex_color("fff"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
    }

    #[test]
    fn test_gif_defaults() {
        let gif = GifSettings::default();
        assert_eq!(gif.frame_rate, 20);
        assert_eq!(gif.alpha_threshold, 128);
        assert!(gif.loop_forever);
        assert_eq!(gif.matte_rgb(), Some([255, 255, 255]));
    }
}
