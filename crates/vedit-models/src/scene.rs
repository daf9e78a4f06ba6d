//! Animated scene definition.
//!
//! A [`Scene`] is the immutable description of the overlay animation. It is
//! turned into a self-contained HTML document that the headless browser
//! loads; the animation itself runs as CSS keyframes inside the page.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// CSS class of the element wrapping all animated squares.
pub const CONTAINER_CLASS: &str = "container";

/// CSS class of each animated square.
pub const ELEMENT_CLASS: &str = "square";

/// Easing curve for the element motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    InOutQuad,
    InOutCubic,
    #[default]
    InOutQuint,
}

impl Easing {
    /// CSS timing function for this easing.
    pub fn css(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::InOutQuad => "cubic-bezier(0.45, 0, 0.55, 1)",
            Easing::InOutCubic => "cubic-bezier(0.65, 0, 0.35, 1)",
            Easing::InOutQuint => "cubic-bezier(0.83, 0, 0.17, 1)",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Easing::Linear => "linear",
            Easing::InOutQuad => "in_out_quad",
            Easing::InOutCubic => "in_out_cubic",
            Easing::InOutQuint => "in_out_quint",
        };
        f.write_str(name)
    }
}

/// Immutable animation definition rendered by the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Scene {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Number of animated squares
    pub element_count: u32,
    /// Square edge length in pixels
    pub element_size: u32,
    /// Vertical gap between squares in pixels
    pub element_gap: u32,
    /// Square fill color (any CSS color)
    pub element_color: String,
    /// Horizontal travel distance in pixels
    pub travel_x: i32,
    /// Starting rotation in degrees (animates towards 0)
    pub rotate_from: i32,
    /// Duration of one animation pass in milliseconds
    pub duration_ms: u32,
    /// Delay step between neighbouring squares, staggered from the center
    pub stagger_ms: u32,
    /// Easing curve
    pub easing: Easing,
    /// Repeat forever
    pub looping: bool,
    /// Reverse direction on every other pass
    pub alternate: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: 500,
            height: 300,
            element_count: 5,
            element_size: 30,
            element_gap: 10,
            element_color: "#f43f5e".to_string(),
            travel_x: 320,
            rotate_from: -180,
            duration_ms: 1250,
            stagger_ms: 65,
            easing: Easing::InOutQuint,
            looping: true,
            alternate: true,
        }
    }
}

impl Scene {
    /// Validate the scene.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err("Scene canvas width/height must be non-zero".to_string());
        }

        if self.element_count == 0 {
            return Err("Scene must contain at least one element".to_string());
        }

        if self.duration_ms == 0 {
            return Err("Scene animation duration must be non-zero".to_string());
        }

        if self.element_color.trim().is_empty() {
            return Err("Scene element color must be specified".to_string());
        }

        Ok(())
    }

    /// Animation delay for the element at `index`, staggered outwards from
    /// the center element.
    pub fn delay_ms(&self, index: u32) -> u32 {
        let center = (self.element_count.saturating_sub(1)) as f64 / 2.0;
        let distance = (index as f64 - center).abs();
        (distance * self.stagger_ms as f64).round() as u32
    }

    /// Render the scene as a self-contained HTML document.
    pub fn to_html(&self) -> String {
        let iterations = if self.looping { "infinite" } else { "1" };
        let direction = if self.alternate { "alternate" } else { "normal" };

        let mut delays = String::new();
        for i in 0..self.element_count {
            // nth-child is 1-based
            let _ = writeln!(
                delays,
                "      .{}:nth-child({}) {{ animation-delay: {}ms; }}",
                ELEMENT_CLASS,
                i + 1,
                self.delay_ms(i)
            );
        }

        let elements: String = (0..self.element_count)
            .map(|_| format!("      <div class=\"{}\"></div>\n", ELEMENT_CLASS))
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <style>
      html, body {{
        background-color: rgba(0,0,0,0) !important;
        margin: 0;
        padding: 0;
        width: {width}px;
        height: {height}px;
        overflow: hidden;
      }}
      .{container} {{
        display: flex;
        flex-direction: column;
        gap: {gap}px;
        background-color: rgba(0,0,0,0) !important;
      }}
      .{element} {{
        width: {size}px;
        height: {size}px;
        background: {color};
        animation: vedit-move {duration}ms {easing} {iterations} {direction} both;
      }}
{delays}      @keyframes vedit-move {{
        from {{ transform: translateX(0px) rotate({rotate}deg); }}
        to {{ transform: translateX({travel}px) rotate(0deg); }}
      }}
    </style>
  </head>
  <body>
    <div class="{container}">
{elements}    </div>
  </body>
</html>
"#,
            width = self.width,
            height = self.height,
            container = CONTAINER_CLASS,
            element = ELEMENT_CLASS,
            gap = self.element_gap,
            size = self.element_size,
            color = self.element_color,
            duration = self.duration_ms,
            easing = self.easing.css(),
            iterations = iterations,
            direction = direction,
            delays = delays,
            rotate = self.rotate_from,
            travel = self.travel_x,
            elements = elements,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scene_is_valid() {
        let scene = Scene::default();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.element_count, 5);
        assert_eq!((scene.width, scene.height), (500, 300));
    }

    #[test]
    fn test_stagger_from_center() {
        let scene = Scene::default();
        let delays: Vec<u32> = (0..5).map(|i| scene.delay_ms(i)).collect();
        assert_eq!(delays, vec![130, 65, 0, 65, 130]);
    }

    #[test]
    fn test_html_contains_every_element() {
        let html = Scene::default().to_html();
        assert_eq!(html.matches("<div class=\"square\">").count(), 5);
        assert!(html.contains("infinite alternate"));
        assert!(html.contains("rotate(-180deg)"));
        assert!(html.contains("translateX(320px)"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_validate_rejects_empty_scene() {
        let scene = Scene {
            element_count: 0,
            ..Default::default()
        };
        assert!(scene.validate().is_err());
    }

    #[test]
    fn test_scene_from_partial_json() {
        let scene: Scene = serde_json::from_str(r#"{"element_count": 3, "easing": "linear"}"#).unwrap();
        assert_eq!(scene.element_count, 3);
        assert_eq!(scene.easing, Easing::Linear);
        assert_eq!(scene.width, 500);
    }
}
