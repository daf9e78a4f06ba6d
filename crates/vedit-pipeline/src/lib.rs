//! Animated overlay pipeline orchestrator.
//!
//! Renders an HTML animation to transparent frames, encodes them as a
//! looping GIF, builds a base video from faded clips in parallel, and
//! composites the GIF over it. All external tools are reached through the
//! capability traits in `vedit_media`.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod overlay_asset;
pub mod pipeline;
pub mod report;
pub mod segments;

pub use config::PipelineConfig;
pub use error::{ClipFailure, PipelineError, PipelineResult};
pub use logging::RunLogger;
pub use pipeline::Pipeline;
pub use report::{ClipOutcome, PipelineReport};
