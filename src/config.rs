//! Engine configuration.
//!
//! Everything has a default that reproduces the built-in behavior, so an
//! empty TOML document is a valid configuration:
//!
//! ```toml
//! identity_threshold = 0.01
//! full_threshold = 0.99
//! noise_seed = 1592642768
//!
//! [batch]
//! parallel = true
//! threads = 0
//! output_format = "png"
//!
//! [[styles]]
//! id = "sepia"
//! name = "Sepia"
//! stages = [
//!     { op = "monochrome" },
//!     { op = "gains", r = 1.1, g = 1.0, b = 0.85 },
//! ]
//! ```

use crate::core::error::ConfigError;
use crate::core::operator::Operator;
use crate::execution::chain::StageSpec;
use crate::filters::builtin::DEFAULT_NOISE_SEED;
use crate::filters::styles::{normalize_id, FilterStyle, StyleCategory};
use crate::filters::StyleMetadata;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Intensities at or below this return the input unchanged.
pub const DEFAULT_IDENTITY_THRESHOLD: f32 = 0.01;

/// Intensities at or above this return the fully filtered image.
pub const DEFAULT_FULL_THRESHOLD: f32 = 0.99;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Intensity at or below which the pipeline short-circuits to the input.
    pub identity_threshold: f32,
    /// Intensity at or above which no blending happens.
    pub full_threshold: f32,
    /// Seed of the noise and grain stages.
    pub noise_seed: u64,
    /// Batch processing options.
    pub batch: BatchConfig,
    /// Additional styles.
    pub styles: Vec<CustomStyle>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity_threshold: DEFAULT_IDENTITY_THRESHOLD,
            full_threshold: DEFAULT_FULL_THRESHOLD,
            noise_seed: DEFAULT_NOISE_SEED,
            batch: BatchConfig::default(),
            styles: Vec::new(),
        }
    }
}

/// Batch processing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Whether to process images in parallel.
    pub parallel: bool,
    /// Maximum number of worker threads (0 = use all available).
    pub threads: usize,
    /// Extension of written files (`png`, `jpg`, ...).
    pub output_format: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: 0,
            output_format: "png".to_string(),
        }
    }
}

/// A style declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomStyle {
    /// Style id, normalized like the built-in ids
    pub id: String,
    /// Display name (defaults to the id)
    #[serde(default)]
    pub name: Option<String>,
    /// Category (defaults to custom)
    #[serde(default)]
    pub category: StyleCategory,
    /// Whether the style is part of the paid set
    #[serde(default)]
    pub premium: bool,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Ordered stages
    pub stages: Vec<StageSpec>,
}

impl CustomStyle {
    /// Registry metadata for this style.
    pub fn metadata(&self) -> StyleMetadata {
        let id = normalize_id(&self.id);
        StyleMetadata {
            name: self.name.clone().unwrap_or_else(|| id.clone()),
            id,
            category: self.category.clone(),
            premium: self.premium,
            description: self.description.clone(),
            builtin: false,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blend thresholds.
    pub fn with_thresholds(mut self, identity: f32, full: f32) -> Self {
        self.identity_threshold = identity;
        self.full_threshold = full;
        self
    }

    /// Set the noise seed.
    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = seed;
        self
    }

    /// Enable/disable parallel batches.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.batch.parallel = parallel;
        self
    }

    /// Set maximum batch threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.batch.threads = threads;
        self
    }

    /// Add a custom style.
    pub fn with_style(mut self, style: CustomStyle) -> Self {
        self.styles.push(style);
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        let config = Self::from_toml_str(&source)?;
        log::info!(
            "loaded config from {} ({} custom styles)",
            path.display(),
            config.styles.len()
        );
        Ok(config)
    }

    /// Check thresholds, output format and custom styles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (lo, hi) = (self.identity_threshold, self.full_threshold);
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || hi > 1.0 || lo >= hi {
            return Err(invalid(
                "identity_threshold",
                format!("thresholds must satisfy 0 <= identity < full <= 1, got {lo} and {hi}"),
            ));
        }

        if image::ImageFormat::from_extension(&self.batch.output_format).is_none() {
            return Err(invalid(
                "batch.output_format",
                format!("unknown image format '{}'", self.batch.output_format),
            ));
        }

        let mut seen = HashSet::new();
        for style in &self.styles {
            let id = normalize_id(&style.id);
            let key = format!("styles.{id}");
            if id.is_empty() {
                return Err(invalid("styles.id", "must not be empty"));
            }
            if id.parse::<FilterStyle>().is_ok() {
                return Err(invalid(&key, "shadows a built-in style"));
            }
            if !seen.insert(id.clone()) {
                return Err(invalid(&key, "declared twice"));
            }
            for (index, stage) in style.stages.iter().enumerate() {
                stage
                    .build(self.noise_seed)
                    .validate()
                    .map_err(|e| invalid(&format!("{key}.stages[{index}]"), e.to_string()))?;
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.into(),
    }
}
