//! # Retrocam - Retro Camera Filter Engine
//!
//! Retrocam turns photos and live preview frames into film and early
//! digital camera looks. Every look is a fixed, ordered chain of small image
//! operators; the result is blended with the original by an intensity.
//!
//! ## Features
//!
//! - **13 Built-in Styles**: CCD compacts, film stocks and vintage looks
//! - **Data-driven Chains**: styles are lists of serializable stages, custom
//!   styles can be declared in a TOML config
//! - **Intensity Blending**: uniform linear blend between original and result
//! - **Graceful Degradation**: a failing stage is skipped, never surfaced to
//!   interactive callers
//! - **Deterministic Grain**: seeded noise, identical on every call and thread
//! - **Frames and Watermarks**: polaroid, film strip and classic borders,
//!   date stamps and custom text
//! - **Parallel**: row-parallel operators and image-parallel batches (rayon)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use retrocam::prelude::*;
//!
//! let photo = image::open("input.jpg").unwrap();
//! let input = Image::from_dynamic(&photo);
//!
//! // Full strength
//! let styled = retrocam::apply_style(&input, FilterStyle::CcdClassic);
//!
//! // 60 % blended with the original
//! let subtle = retrocam::apply_style_with_intensity(&input, FilterStyle::KodakGold200, 0.6);
//!
//! // With a frame, through the still-image adapter
//! let request = StillRequest::new("ilford-hp5").with_frame(FrameStyle::Polaroid, 1.0);
//! let output = FilterPipeline::shared().render_still(&photo, &request).unwrap();
//! output.image.save("output.png").unwrap();
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: the [`Image`](core::Image) value type, the
//!   [`Operator`](core::Operator) trait and error handling
//! - [`filters`]: operators, style recipes and the style registry
//! - [`execution`]: chain runner, filter pipeline, rendering adapter and
//!   batch processing
//! - [`config`]: TOML engine configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod execution;
pub mod filters;

use crate::core::types::Image;
use crate::execution::engine::FilterPipeline;
use crate::filters::styles::FilterStyle;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use retrocam::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{Color, Extent, Image, Pixel};

    // Operator trait and types
    pub use crate::core::operator::{Category, Operator, OperatorMetadata};

    // Errors
    pub use crate::core::error::{BatchError, ConfigError, OperatorError, RetroError, RetroResult};

    // Configuration
    pub use crate::config::{BatchConfig, CustomStyle, EngineConfig};

    // Execution
    pub use crate::execution::batch::{BatchProcessor, BatchReport};
    pub use crate::execution::chain::{StageFailure, StageSpec, StyleChain};
    pub use crate::execution::engine::{BlendMode, FilterPipeline, RenderOutput, RenderStatus};
    pub use crate::execution::render::{PreviewThrottle, StillRequest};

    // Styles
    pub use crate::filters::registry::{StyleMetadata, StyleRegistry};
    pub use crate::filters::styles::{FilterStyle, StyleCategory};

    // Frames and watermarks
    pub use crate::filters::builtin::{apply_frame, apply_watermark, FrameStyle, WatermarkType};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Apply `style` at full intensity with the shared default pipeline.
pub fn apply_style(image: &Image, style: FilterStyle) -> Image {
    FilterPipeline::shared().apply_style(image, style)
}

/// Apply `style` blended with the original by `intensity` (clamped into
/// `[0, 1]`) with the shared default pipeline.
pub fn apply_style_with_intensity(image: &Image, style: FilterStyle, intensity: f32) -> Image {
    FilterPipeline::shared().apply_style_with_intensity(image, style, intensity)
}

/// Apply `style` to a live preview frame with the shared default pipeline.
pub fn apply_style_to_frame(frame: &Image, style: FilterStyle) -> Image {
    FilterPipeline::shared().apply_style_to_frame(frame, style)
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    fn checker() -> Image {
        Image::from_fn(24, 16, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                [0.8, 0.3, 0.2, 1.0]
            } else {
                [0.1, 0.5, 0.9, 1.0]
            }
        })
    }

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "retrocam");
    }

    #[test]
    fn test_free_functions_match_pipeline() {
        let img = checker();
        let pipeline = FilterPipeline::default();
        for style in FilterStyle::ALL {
            assert_eq!(super::apply_style(&img, style), pipeline.apply_style(&img, style));
            assert_eq!(super::apply_style_with_intensity(&img, style, 0.0), img);
            assert_eq!(
                super::apply_style_to_frame(&img, style),
                super::apply_style_with_intensity(&img, style, 1.0)
            );
        }
    }

    #[test]
    fn test_styles_change_pixels() {
        let img = checker();
        for style in FilterStyle::ALL.into_iter().filter(|s| !s.is_identity()) {
            let out = super::apply_style(&img, style);
            assert!(img.mean_abs_diff(&out).unwrap() > 1e-3, "{} left the image untouched", style);
        }
    }

    #[test]
    fn test_vignette_scenario() {
        let img = Image::solid(64, 64, [0.6, 0.6, 0.6, 1.0]);
        let none = StyleChain::build(
            vec![StageSpec::Vignette {
                intensity: 0.0,
                radius: 1.0,
            }],
            0,
        )
        .run(&img)
        .image;
        assert_eq!(none.pixel(0, 0), none.pixel(32, 32));

        let full = StyleChain::build(
            vec![StageSpec::Vignette {
                intensity: 1.0,
                radius: 1.0,
            }],
            0,
        )
        .run(&img)
        .image;
        assert!(full.pixel(0, 0)[0] + 0.3 < full.pixel(32, 32)[0]);
    }
}
