//! Overlay placement.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Corner of the base video the overlay is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Corner {
    type Err = CornerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "top_left" => Ok(Corner::TopLeft),
            "top_right" => Ok(Corner::TopRight),
            "bottom_left" => Ok(Corner::BottomLeft),
            "bottom_right" => Ok(Corner::BottomRight),
            _ => Err(CornerParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown overlay corner: {0}")]
pub struct CornerParseError(String);

/// Fixed overlay position: a corner plus a pixel margin from both edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OverlayPosition {
    pub corner: Corner,
    pub margin: u32,
}

impl Default for OverlayPosition {
    fn default() -> Self {
        Self {
            corner: Corner::TopRight,
            margin: 10,
        }
    }
}

impl OverlayPosition {
    pub fn new(corner: Corner, margin: u32) -> Self {
        Self { corner, margin }
    }

    /// ffmpeg overlay `x` expression.
    pub fn x_expr(&self) -> String {
        match self.corner {
            Corner::TopLeft | Corner::BottomLeft => self.margin.to_string(),
            Corner::TopRight | Corner::BottomRight => {
                format!("main_w-overlay_w-{}", self.margin)
            }
        }
    }

    /// ffmpeg overlay `y` expression.
    pub fn y_expr(&self) -> String {
        match self.corner {
            Corner::TopLeft | Corner::TopRight => self.margin.to_string(),
            Corner::BottomLeft | Corner::BottomRight => {
                format!("main_h-overlay_h-{}", self.margin)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position_is_top_right() {
        let pos = OverlayPosition::default();
        assert_eq!(pos.x_expr(), "main_w-overlay_w-10");
        assert_eq!(pos.y_expr(), "10");
    }

    #[test]
    fn test_bottom_left_expressions() {
        let pos = OverlayPosition::new(Corner::BottomLeft, 24);
        assert_eq!(pos.x_expr(), "24");
        assert_eq!(pos.y_expr(), "main_h-overlay_h-24");
    }

    #[test]
    fn test_corner_parse() {
        assert_eq!("bottom-right".parse::<Corner>().unwrap(), Corner::BottomRight);
        assert!("middle".parse::<Corner>().is_err());
    }
}
