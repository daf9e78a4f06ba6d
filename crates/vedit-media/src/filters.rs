//! FFmpeg filter expressions.

use vedit_models::{Clip, ClipEffect, GifSettings, OverlayPosition, FADE_DURATION_SECS};

/// Blur applied by [`ClipEffect::Blur`].
pub const FILTER_BLUR: &str = "boxblur=10:1:cr=0:ar=0";

/// Output label of the overlay filter graph.
pub const OVERLAY_OUTPUT_LABEL: &str = "[vout]";

/// Shared-palette GIF filter with one reserved transparent entry.
pub fn filter_gif_palette(settings: &GifSettings) -> String {
    format!(
        "split[s0][s1];[s0]palettegen=reserve_transparent=1:transparency_color={}[p];[s1][p]paletteuse=alpha_threshold={}",
        settings.matte_color.trim_start_matches('#'),
        settings.alpha_threshold
    )
}

/// Video filter for a clip's effect, or `None` for a lossless extraction.
///
/// Fades last one second, shortened to the clip length for shorter clips.
pub fn filter_clip_effect(clip: &Clip) -> Option<String> {
    let fade = FADE_DURATION_SECS.min(clip.duration);
    match clip.effect {
        ClipEffect::None => None,
        ClipEffect::FadeIn => Some(format!("fade=t=in:st=0:d={}", format_secs(fade))),
        ClipEffect::FadeOut => Some(format!(
            "fade=t=out:st={}:d={}",
            format_secs((clip.duration - fade).max(0.0)),
            format_secs(fade)
        )),
        ClipEffect::Blur => Some(FILTER_BLUR.to_string()),
    }
}

/// Overlay graph: base is input 0, animation is input 1.
pub fn filter_overlay(position: &OverlayPosition) -> String {
    format!(
        "[0:v][1:v]overlay={}:{}:shortest=1{}",
        position.x_expr(),
        position.y_expr(),
        OVERLAY_OUTPUT_LABEL
    )
}

/// Seconds without trailing zeros (`1`, `4`, `0.5`).
fn format_secs(secs: f64) -> String {
    let s = format!("{:.3}", secs);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
