//! Ordered operator chains.
//!
//! A style is data: a list of [`StageSpec`] values. [`StyleChain::build`]
//! turns that list into boxed operators once, and [`StyleChain::run`]
//! applies them in order. A stage that fails is skipped and recorded; the
//! image it received flows on to the next stage.

use crate::core::error::OperatorError;
use crate::core::operator::{Operator, Passthrough};
use crate::core::types::{Color, Image};
use crate::filters::builtin::{
    ColorControls, ColorMatrix, Exposure, LightLeak, Monochrome, Noise, SharpenLuminance, ToneCurve,
    Vignette, WhiteBalance,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

fn one() -> f32 {
    1.0
}

fn default_center() -> (f32, f32) {
    LightLeak::default().center
}

fn default_inner_radius() -> f32 {
    LightLeak::default().inner_radius
}

fn default_outer_radius() -> f32 {
    LightLeak::default().outer_radius
}

fn default_inner_color() -> Color {
    LightLeak::default().inner_color
}

fn default_outer_color() -> Color {
    LightLeak::default().outer_color
}

/// Serializable description of one stage.
///
/// Deserializes from tables such as
/// `{ op = "vignette", intensity = 0.3, radius = 1.5 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StageSpec {
    /// Saturation / brightness / contrast.
    ColorControls {
        #[serde(default = "one")]
        saturation: f32,
        #[serde(default)]
        brightness: f32,
        #[serde(default = "one")]
        contrast: f32,
    },
    /// Per-channel gains.
    Gains { r: f32, g: f32, b: f32 },
    /// Full RGB cross-mix; each row holds the (r, g, b) weights.
    ColorMatrix {
        red: [f32; 3],
        green: [f32; 3],
        blue: [f32; 3],
    },
    /// Exposure in stops.
    Exposure { ev: f32 },
    /// White point shift; neutrals are `(kelvin, tint)`.
    WhiteBalance { neutral: (f32, f32), target: (f32, f32) },
    /// Luminance to gray.
    Monochrome,
    /// Five-point luminance curve.
    ToneCurve { points: [(f32, f32); 5] },
    /// Luminance unsharp mask.
    SharpenLuminance { sharpness: f32 },
    /// Digital noise.
    Noise { intensity: f32 },
    /// Film grain (noise at 1.2× intensity).
    Grain { intensity: f32 },
    /// Radial vignette.
    Vignette { intensity: f32, radius: f32 },
    /// Warm corner light leak.
    LightLeak {
        #[serde(default = "default_center")]
        center: (f32, f32),
        #[serde(default = "default_inner_radius")]
        inner_radius: f32,
        #[serde(default = "default_outer_radius")]
        outer_radius: f32,
        #[serde(default = "default_inner_color")]
        inner_color: Color,
        #[serde(default = "default_outer_color")]
        outer_color: Color,
    },
    /// No-op.
    Passthrough,
}

impl StageSpec {
    /// The default light leak.
    pub fn light_leak() -> Self {
        let leak = LightLeak::default();
        StageSpec::LightLeak {
            center: leak.center,
            inner_radius: leak.inner_radius,
            outer_radius: leak.outer_radius,
            inner_color: leak.inner_color,
            outer_color: leak.outer_color,
        }
    }

    /// Build the operator described by this stage.
    ///
    /// `seed` feeds the noise and grain stages.
    pub fn build(&self, seed: u64) -> Box<dyn Operator> {
        match self {
            StageSpec::ColorControls {
                saturation,
                brightness,
                contrast,
            } => Box::new(ColorControls::new(*saturation, *brightness, *contrast)),
            StageSpec::Gains { r, g, b } => Box::new(ColorMatrix::gains(*r, *g, *b)),
            StageSpec::ColorMatrix { red, green, blue } => Box::new(ColorMatrix::mix(*red, *green, *blue)),
            StageSpec::Exposure { ev } => Box::new(Exposure { ev: *ev }),
            StageSpec::WhiteBalance { neutral, target } => Box::new(WhiteBalance {
                neutral: *neutral,
                target: *target,
            }),
            StageSpec::Monochrome => Box::new(Monochrome),
            StageSpec::ToneCurve { points } => Box::new(ToneCurve { points: *points }),
            StageSpec::SharpenLuminance { sharpness } => Box::new(SharpenLuminance { sharpness: *sharpness }),
            StageSpec::Noise { intensity } => Box::new(Noise::digital(*intensity, seed)),
            StageSpec::Grain { intensity } => Box::new(Noise::grain(*intensity, seed)),
            StageSpec::Vignette { intensity, radius } => Box::new(Vignette {
                intensity: *intensity,
                radius: *radius,
            }),
            StageSpec::LightLeak {
                center,
                inner_radius,
                outer_radius,
                inner_color,
                outer_color,
            } => Box::new(LightLeak {
                center: *center,
                inner_radius: *inner_radius,
                outer_radius: *outer_radius,
                inner_color: *inner_color,
                outer_color: *outer_color,
            }),
            StageSpec::Passthrough => Box::new(Passthrough),
        }
    }
}

/// A stage that failed and was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    /// Position of the stage in the chain.
    pub index: usize,
    /// Operator id of the stage.
    pub operator: String,
    /// Why it failed.
    pub error: OperatorError,
}

/// Chain execution statistics.
#[derive(Debug, Clone, Default)]
pub struct ChainStats {
    /// Total execution time.
    pub total_duration: Duration,
    /// Number of stages that produced output.
    pub stages_executed: usize,
    /// Number of stages skipped after an error.
    pub stages_skipped: usize,
}

/// Result of running a chain.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    /// The final image.
    pub image: Image,
    /// Stages that failed, in order.
    pub failures: Vec<StageFailure>,
    /// Execution statistics.
    pub stats: ChainStats,
}

impl ChainOutput {
    /// Whether every stage ran.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An ordered list of prebuilt operators.
#[derive(Debug, Clone, Default)]
pub struct StyleChain {
    specs: Vec<StageSpec>,
    stages: Vec<Box<dyn Operator>>,
}

impl StyleChain {
    /// Build a chain from stage descriptions.
    pub fn build(specs: Vec<StageSpec>, seed: u64) -> Self {
        let stages = specs.iter().map(|s| s.build(seed)).collect();
        Self { specs, stages }
    }

    /// An empty chain (identity).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The stage descriptions, in execution order.
    pub fn specs(&self) -> &[StageSpec] {
        &self.specs
    }

    /// The built operators, in execution order.
    pub fn stages(&self) -> &[Box<dyn Operator>] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// A chain holding only the first `n` stages.
    pub fn truncated(&self, n: usize) -> Self {
        let n = n.min(self.stages.len());
        Self {
            specs: self.specs[..n].to_vec(),
            stages: self.stages[..n].to_vec(),
        }
    }

    /// Run every stage in order.
    ///
    /// Never fails: a stage returning an error is skipped, logged at warn
    /// level and recorded in [`ChainOutput::failures`].
    pub fn run(&self, image: &Image) -> ChainOutput {
        let start_time = Instant::now();
        let mut current = image.clone();
        let mut failures = Vec::new();
        let mut stats = ChainStats::default();

        for (index, stage) in self.stages.iter().enumerate() {
            match stage.apply(&current) {
                Ok(next) => {
                    log::debug!("stage {} '{}' done", index, stage.metadata().id);
                    stats.stages_executed += 1;
                    current = next;
                }
                Err(error) => {
                    let operator = stage.metadata().id;
                    log::warn!("stage {} '{}' skipped: {}", index, operator, error);
                    stats.stages_skipped += 1;
                    failures.push(StageFailure {
                        index,
                        operator,
                        error,
                    });
                }
            }
        }

        stats.total_duration = start_time.elapsed();
        ChainOutput {
            image: current,
            failures,
            stats,
        }
    }
}
