//! Radial vignette.

use crate::core::error::{OperatorError, OperatorResult};
use crate::core::operator::{require_finite, require_non_negative, Category, Operator, OperatorMetadata};
use crate::core::types::Image;

/// Radial darkening from the image center outward.
///
/// With `d` the distance to the center normalized by the half-diagonal
/// (0 at the center, 1 at the corners), each pixel's RGB is multiplied by
/// `1 - intensity * min(d / radius, 1)^2`, floored at 0. A larger radius
/// pushes the falloff outward; radius 1 with intensity 1 turns the corners
/// black.
#[derive(Debug, Clone, PartialEq)]
pub struct Vignette {
    /// How dark the corners get
    pub intensity: f32,
    /// Falloff radius relative to the half-diagonal
    pub radius: f32,
}

impl Vignette {
    /// Shading factor at normalized distance `d`.
    pub fn shade(&self, d: f32) -> f32 {
        let t = (d / self.radius).min(1.0);
        (1.0 - self.intensity * t * t).max(0.0)
    }
}

impl Operator for Vignette {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("vignette", "Vignette")
            .category(Category::Lens)
            .description("Darken the image towards its corners")
            .parameter("intensity", self.intensity)
            .parameter("radius", self.radius)
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        require_non_negative("vignette", "intensity", self.intensity)?;
        require_finite("vignette", "radius", self.radius)?;
        if self.radius <= 0.0 {
            return Err(OperatorError::invalid("vignette", "radius", "must be positive"));
        }
        Ok(())
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        let cx = image.width() as f32 / 2.0;
        let cy = image.height() as f32 / 2.0;
        let half_diagonal = (cx * cx + cy * cy).sqrt();

        Ok(image.map_pixels(|x, y, px| {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt() / half_diagonal;
            let k = self.shade(d);
            [px[0] * k, px[1] * k, px[2] * k, px[3]]
        }))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}
