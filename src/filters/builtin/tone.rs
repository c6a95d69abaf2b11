//! Tone curve operator.

use crate::core::error::{OperatorError, OperatorResult};
use crate::core::operator::{require_finite, Category, Operator, OperatorMetadata};
use crate::core::types::{clamp_pixel, luminance, Image};

/// Piecewise-linear luminance curve through five control points.
///
/// Control points are `(input, output)` pairs with strictly increasing
/// inputs inside `[0, 1]`. Inputs outside the first/last point hold the
/// end values. Each pixel's RGB is rescaled by `curve(luma) / luma`, so hue
/// survives the remap; pure black maps to the gray level of `curve(0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneCurve {
    /// Control points `(input, output)`, x strictly increasing
    pub points: [(f32, f32); 5],
}

impl ToneCurve {
    /// The identity curve.
    pub fn linear() -> Self {
        Self {
            points: [(0.0, 0.0), (0.25, 0.25), (0.5, 0.5), (0.75, 0.75), (1.0, 1.0)],
        }
    }

    /// Evaluate the curve at `x`.
    pub fn evaluate(&self, x: f32) -> f32 {
        let first = self.points[0];
        if x <= first.0 {
            return first.1;
        }
        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x <= x1 {
                let t = (x - x0) / (x1 - x0);
                return y0 + (y1 - y0) * t;
            }
        }
        self.points[4].1
    }
}

impl Operator for ToneCurve {
    fn metadata(&self) -> OperatorMetadata {
        let mut builder = OperatorMetadata::builder("tone_curve", "Tone Curve")
            .category(Category::Tone)
            .description("Remap luminance through five control points");
        for (i, (x, y)) in self.points.iter().enumerate() {
            builder = builder.parameter(format!("x{}", i), *x).parameter(format!("y{}", i), *y);
        }
        builder.build()
    }

    fn validate(&self) -> OperatorResult<()> {
        for (x, y) in &self.points {
            require_finite("tone_curve", "points", *x)?;
            require_finite("tone_curve", "points", *y)?;
            if !(0.0..=1.0).contains(x) {
                return Err(OperatorError::invalid("tone_curve", "points", format!("x {} outside [0, 1]", x)));
            }
        }
        if self.points.windows(2).any(|p| p[1].0 <= p[0].0) {
            return Err(OperatorError::invalid(
                "tone_curve",
                "points",
                "x coordinates must be strictly increasing",
            ));
        }
        Ok(())
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        Ok(image.map_pixels(|_, _, px| {
            let luma = luminance(&px);
            let mapped = self.evaluate(luma.clamp(0.0, 1.0));
            if luma <= 1e-5 {
                clamp_pixel([mapped, mapped, mapped, px[3]])
            } else {
                let k = mapped / luma;
                clamp_pixel([px[0] * k, px[1] * k, px[2] * k, px[3]])
            }
        }))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leica_curve() -> ToneCurve {
        ToneCurve {
            points: [(0.0, 0.22), (0.25, 0.3), (0.5, 0.5), (0.75, 0.7), (1.0, 1.0)],
        }
    }

    #[test]
    fn test_evaluate_segments() {
        let curve = leica_curve();
        assert!((curve.evaluate(0.0) - 0.22).abs() < 1e-6);
        assert!((curve.evaluate(0.125) - 0.26).abs() < 1e-6);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!((curve.evaluate(0.875) - 0.85).abs() < 1e-6);
        assert!((curve.evaluate(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_black_point_lift() {
        let out = leica_curve().apply(&Image::solid(1, 1, [0.0, 0.0, 0.0, 1.0])).unwrap();
        assert!((out.pixel(0, 0)[0] - 0.22).abs() < 1e-6);
    }

    #[test]
    fn test_linear_curve_is_identity() {
        let img = Image::solid(2, 1, [0.3, 0.6, 0.2, 1.0]);
        let out = ToneCurve::linear().apply(&img).unwrap();
        assert!(out.max_abs_diff(&img).unwrap() < 1e-5);
    }

    #[test]
    fn test_rejects_unsorted_points() {
        let mut curve = leica_curve();
        curve.points.swap(1, 2);
        assert!(curve.validate().is_err());
    }
}
