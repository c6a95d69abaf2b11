//! Execution module.
//!
//! This module runs style chains: the ordered chain runner, the intensity
//! blending pipeline, the still/preview rendering adapter and batches.

pub mod batch;
pub mod chain;
pub mod engine;
pub mod render;

pub use batch::{BatchItem, BatchProcessor, BatchReport};
pub use chain::{ChainOutput, ChainStats, StageFailure, StageSpec, StyleChain};
pub use engine::{sanitize_intensity, BlendMode, FilterPipeline, RenderOutput, RenderStatus};
pub use render::{PreviewThrottle, StillOutput, StillRequest, DEFAULT_PREVIEW_INTERVAL};
