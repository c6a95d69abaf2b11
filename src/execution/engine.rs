//! Filter pipeline implementation.
//!
//! The pipeline maps `(Image, style, intensity)` to a stylized image. It
//! holds immutable configuration and prebuilt operator chains only, so one
//! instance can serve any number of threads.

use crate::config::EngineConfig;
use crate::core::types::Image;
use crate::execution::chain::{ChainStats, StageFailure, StyleChain};
use crate::filters::builtin::blend;
use crate::filters::registry::StyleRegistry;
use crate::filters::styles::FilterStyle;
use std::sync::OnceLock;

/// Whether every stage of a render ran.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RenderStatus {
    /// All stages ran, or none had to.
    #[default]
    Complete,
    /// Some stages failed and were skipped.
    Degraded {
        /// The skipped stages, in order.
        failures: Vec<StageFailure>,
    },
}

impl RenderStatus {
    /// Check if the render is degraded.
    pub fn is_degraded(&self) -> bool {
        matches!(self, RenderStatus::Degraded { .. })
    }

    /// The skipped stages (empty when complete).
    pub fn failures(&self) -> &[StageFailure] {
        match self {
            RenderStatus::Complete => &[],
            RenderStatus::Degraded { failures } => failures,
        }
    }
}

/// How the output was produced from the chain result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// The input was returned without running the chain.
    Original,
    /// The chain output was returned as-is.
    Filtered,
    /// The chain output was blended with the input.
    Blended,
}

/// Result of [`FilterPipeline::render`].
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The output image.
    pub image: Image,
    /// Complete or degraded.
    pub status: RenderStatus,
    /// Intensity after clamping.
    pub intensity: f32,
    /// How the output relates to the chain result.
    pub mode: BlendMode,
    /// Chain statistics (default when the chain did not run).
    pub stats: ChainStats,
}

impl RenderOutput {
    fn original(image: &Image, intensity: f32) -> Self {
        Self {
            image: image.clone(),
            status: RenderStatus::Complete,
            intensity,
            mode: BlendMode::Original,
            stats: ChainStats::default(),
        }
    }
}

/// Clamp an intensity into `[0, 1]`; NaN counts as 0.
pub fn sanitize_intensity(intensity: f32) -> f32 {
    if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    }
}

/// The filter pipeline.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    config: EngineConfig,
    registry: StyleRegistry,
}

impl FilterPipeline {
    /// Create a pipeline holding the built-in styles plus the custom styles
    /// of `config`.
    ///
    /// `config` is expected to be validated (see [`EngineConfig::validate`]);
    /// a custom style with an invalid stage still registers and degrades at
    /// render time.
    pub fn new(config: EngineConfig) -> Self {
        let mut registry = StyleRegistry::with_builtins(config.noise_seed);
        for style in &config.styles {
            registry.register(style.metadata(), style.stages.clone());
        }
        Self::with_registry(config, registry)
    }

    /// Create a pipeline over an explicit registry.
    pub fn with_registry(config: EngineConfig, registry: StyleRegistry) -> Self {
        log::debug!(
            "filter pipeline: {} styles, thresholds {}/{}",
            registry.len(),
            config.identity_threshold,
            config.full_threshold
        );
        Self { config, registry }
    }

    /// The process-wide pipeline with default configuration.
    pub fn shared() -> &'static FilterPipeline {
        static PIPELINE: OnceLock<FilterPipeline> = OnceLock::new();
        PIPELINE.get_or_init(FilterPipeline::default)
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the style registry.
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// Apply a style at full intensity.
    pub fn apply_style(&self, image: &Image, style: FilterStyle) -> Image {
        self.apply_style_with_intensity(image, style, 1.0)
    }

    /// Apply a style blended against the original by `intensity`.
    ///
    /// Never fails: failing stages are skipped.
    pub fn apply_style_with_intensity(&self, image: &Image, style: FilterStyle, intensity: f32) -> Image {
        self.render(image, style, intensity).image
    }

    /// Apply a style to a live preview frame. Same contract as
    /// [`apply_style`](Self::apply_style); keeps no state between calls.
    pub fn apply_style_to_frame(&self, frame: &Image, style: FilterStyle) -> Image {
        self.apply_style(frame, style)
    }

    /// Apply a style by id, including custom styles.
    ///
    /// Unknown ids return the input unchanged.
    pub fn apply_named(&self, image: &Image, id: &str, intensity: f32) -> Image {
        match self.render_named(image, id, intensity) {
            Some(output) => output.image,
            None => {
                log::warn!("unknown style '{}', returning input unchanged", id);
                image.clone()
            }
        }
    }

    /// Render a built-in style and report skipped stages.
    pub fn render(&self, image: &Image, style: FilterStyle, intensity: f32) -> RenderOutput {
        match self.registry.chain(style) {
            Some(chain) => self.render_chain(image, chain, intensity),
            None => {
                // Only reachable when a built-in was unregistered.
                log::warn!("style '{}' is not registered, returning input unchanged", style);
                RenderOutput::original(image, sanitize_intensity(intensity))
            }
        }
    }

    /// Render a style by id. `None` if the id is unknown.
    pub fn render_named(&self, image: &Image, id: &str, intensity: f32) -> Option<RenderOutput> {
        self.registry
            .get(id)
            .map(|entry| self.render_chain(image, &entry.chain, intensity))
    }

    /// Run `chain` over `image` and blend by `intensity`.
    pub fn render_chain(&self, image: &Image, chain: &StyleChain, intensity: f32) -> RenderOutput {
        let intensity = sanitize_intensity(intensity);
        if image.is_empty() || chain.is_empty() || intensity <= self.config.identity_threshold {
            return RenderOutput::original(image, intensity);
        }

        let output = chain.run(image);
        let status = if output.is_complete() {
            RenderStatus::Complete
        } else {
            RenderStatus::Degraded {
                failures: output.failures,
            }
        };

        if intensity >= self.config.full_threshold {
            return RenderOutput {
                image: output.image,
                status,
                intensity,
                mode: BlendMode::Filtered,
                stats: output.stats,
            };
        }

        match blend(image, &output.image, intensity) {
            Ok(blended) => RenderOutput {
                image: blended,
                status,
                intensity,
                mode: BlendMode::Blended,
                stats: output.stats,
            },
            Err(e) => {
                log::warn!("blend failed, returning filtered image: {}", e);
                RenderOutput {
                    image: output.image,
                    status,
                    intensity,
                    mode: BlendMode::Filtered,
                    stats: output.stats,
                }
            }
        }
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
