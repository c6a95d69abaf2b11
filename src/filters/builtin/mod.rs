//! Built-in operator implementations.
//!
//! This module contains the image operators that style chains are built
//! from, plus the watermark and frame compositors that run after a chain.

mod color;
mod composite;
mod frame;
mod noise;
mod sharpen;
mod tone;
mod vignette;
mod watermark;

// Re-export for direct access
pub use color::{kelvin_to_rgb, ColorControls, ColorMatrix, Exposure, Monochrome, WhiteBalance};
pub use composite::{blend, source_over, LightLeak};
pub use frame::{apply_frame, FrameParams, FrameStyle, MAX_FRAMED_PIXELS, MAX_FRAMED_SIDE};
pub use noise::{Noise, DEFAULT_NOISE_SEED, GRAIN_FACTOR};
pub use sharpen::SharpenLuminance;
pub use tone::ToneCurve;
pub use vignette::Vignette;
pub use watermark::{apply_watermark, draw_text, WatermarkPosition, WatermarkStyle, WatermarkType};
