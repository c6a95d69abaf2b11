//! Operator trait and operator metadata.
//!
//! An [`Operator`] is one stage of a style chain. It uses a two-phase
//! design: parameter validation, then processing. Both phases run on
//! every call; operators carry no state between calls.

use crate::core::error::{OperatorError, OperatorResult};
use crate::core::types::Image;
use serde::{Deserialize, Serialize};

/// Category used to group operators in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Saturation, brightness, contrast, exposure
    Adjust,
    /// Channel matrices, white balance, monochrome
    Color,
    /// Tone curves
    Tone,
    /// Sharpening
    Sharpen,
    /// Noise and grain synthesis
    Noise,
    /// Vignettes and other lens shading
    Lens,
    /// Overlays and blending
    Composite,
    /// Utility stages
    #[default]
    Utility,
}

impl Category {
    /// Get the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Adjust => "Adjust",
            Category::Color => "Color",
            Category::Tone => "Tone",
            Category::Sharpen => "Sharpen",
            Category::Noise => "Noise",
            Category::Lens => "Lens",
            Category::Composite => "Composite",
            Category::Utility => "Utility",
        }
    }
}

/// Metadata describing an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorMetadata {
    /// Unique identifier for this operator type (e.g., "vignette")
    pub id: String,
    /// Human-readable name (e.g., "Vignette")
    pub name: String,
    /// Category for listings
    pub category: Category,
    /// Detailed description
    pub description: String,
    /// Baked-in parameter values, in declaration order
    pub parameters: Vec<(String, f64)>,
}

impl OperatorMetadata {
    /// Create a new metadata builder.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> OperatorMetadataBuilder {
        OperatorMetadataBuilder::new(id, name)
    }

    /// Find a parameter value by name.
    pub fn get_parameter(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Builder for OperatorMetadata.
pub struct OperatorMetadataBuilder {
    id: String,
    name: String,
    category: Category,
    description: String,
    parameters: Vec<(String, f64)>,
}

impl OperatorMetadataBuilder {
    /// Create a new builder with required fields.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: Category::default(),
            description: String::new(),
            parameters: Vec::new(),
        }
    }

    /// Set the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Record a parameter value.
    pub fn parameter(mut self, name: impl Into<String>, value: f32) -> Self {
        self.parameters.push((name.into(), value as f64));
        self
    }

    /// Build the metadata.
    pub fn build(self) -> OperatorMetadata {
        OperatorMetadata {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            parameters: self.parameters,
        }
    }
}

/// The core trait for image operators.
///
/// # Design
///
/// 1. **Validation** (`validate`): checks the baked-in parameters. A
///    chain built from configuration may hold nonsense values (a negative
///    vignette radius, a non-monotonic tone curve); validation turns them
///    into an [`OperatorError`] instead of garbage pixels.
///
/// 2. **Processing** (`process`): produces a new image from the input.
///    Never mutates the input and always returns an image of the same
///    extent.
///
/// Callers go through [`Operator::apply`], which runs both phases and
/// rejects empty images.
///
/// # Thread Safety
///
/// `Send + Sync` bounds let one prebuilt chain serve any number of threads.
pub trait Operator: Send + Sync + std::fmt::Debug {
    /// Get the metadata for this operator.
    fn metadata(&self) -> OperatorMetadata;

    /// Validate the operator parameters.
    fn validate(&self) -> OperatorResult<()> {
        Ok(())
    }

    /// Produce the output image.
    fn process(&self, image: &Image) -> OperatorResult<Image>;

    /// Clone this operator into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Operator>;

    /// Validate, then process, checking the extent invariant.
    fn apply(&self, image: &Image) -> OperatorResult<Image> {
        if image.is_empty() {
            return Err(OperatorError::EmptyImage {
                operator: self.metadata().id,
            });
        }
        self.validate()?;
        let output = self.process(image)?;
        if output.extent() != image.extent() {
            return Err(OperatorError::ExtentMismatch {
                expected: image.extent(),
                got: output.extent(),
            });
        }
        Ok(output)
    }
}

impl Clone for Box<dyn Operator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Validate that a parameter is a finite number.
pub fn require_finite(operator: &str, parameter: &str, value: f32) -> OperatorResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OperatorError::invalid(operator, parameter, format!("must be finite, got {}", value)))
    }
}

/// Validate that a parameter is a finite, non-negative number.
pub fn require_non_negative(operator: &str, parameter: &str, value: f32) -> OperatorResult<()> {
    require_finite(operator, parameter, value)?;
    if value < 0.0 {
        return Err(OperatorError::invalid(
            operator,
            parameter,
            format!("must not be negative, got {}", value),
        ));
    }
    Ok(())
}

/// An operator that returns its input unchanged.
///
/// Useful as a placeholder stage in custom styles.
#[derive(Debug, Clone)]
pub struct Passthrough;

impl Operator for Passthrough {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("passthrough", "Passthrough")
            .category(Category::Utility)
            .description("Passes the input through unchanged")
            .build()
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        Ok(image.clone())
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Shrink;

    impl Operator for Shrink {
        fn metadata(&self) -> OperatorMetadata {
            OperatorMetadata::builder("shrink", "Shrink").build()
        }

        fn process(&self, _image: &Image) -> OperatorResult<Image> {
            Ok(Image::new(1, 1))
        }

        fn clone_box(&self) -> Box<dyn Operator> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_metadata_builder() {
        let metadata = OperatorMetadata::builder("test_op", "Test Operator")
            .category(Category::Adjust)
            .description("A test operator")
            .parameter("amount", 0.5)
            .build();

        assert_eq!(metadata.id, "test_op");
        assert_eq!(metadata.category, Category::Adjust);
        assert_eq!(metadata.get_parameter("amount"), Some(0.5));
        assert_eq!(metadata.get_parameter("missing"), None);
    }

    #[test]
    fn test_passthrough_shares_pixels() {
        let image = Image::solid(2, 2, [0.1, 0.2, 0.3, 1.0]);
        let out = Passthrough.apply(&image).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_apply_rejects_empty_image() {
        let err = Passthrough.apply(&Image::new(0, 4)).unwrap_err();
        assert!(matches!(err, OperatorError::EmptyImage { .. }));
    }

    #[test]
    fn test_apply_enforces_extent() {
        let err = Shrink.apply(&Image::new(2, 2)).unwrap_err();
        assert!(matches!(err, OperatorError::ExtentMismatch { .. }));
    }

    #[test]
    fn test_parameter_guards() {
        assert!(require_finite("op", "x", f32::NAN).is_err());
        assert!(require_non_negative("op", "x", -0.1).is_err());
        assert!(require_non_negative("op", "x", 0.0).is_ok());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Noise.display_name(), "Noise");
        assert_eq!(Category::default(), Category::Utility);
    }
}
