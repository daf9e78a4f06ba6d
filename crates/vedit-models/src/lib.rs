//! Shared data models for the animated overlay pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - The animated scene rendered in the browser
//! - Captured frames and stage artifacts
//! - Clip descriptors for the segment path
//! - Overlay placement and encoding settings

pub mod clip;
pub mod encoding;
pub mod frame;
pub mod overlay;
pub mod scene;
pub mod timestamp;

// Re-export common types
pub use clip::{Clip, ClipEffect, FADE_DURATION_SECS};
pub use encoding::{EncodingConfig, GifSettings};
pub use frame::{frame_filename, Artifact, Frame, Stage};
pub use overlay::{Corner, OverlayPosition};
pub use scene::{Easing, Scene};
pub use timestamp::{parse_timestamp, TimestampError};
