//! Compositing: "source over", uniform intensity blending and light leaks.

use crate::core::error::{OperatorError, OperatorResult};
use crate::core::operator::{require_finite, Category, Operator, OperatorMetadata};
use crate::core::types::{clamp_pixel, Color, Image, Pixel};

/// Porter-Duff "source over" of one pixel onto another (straight alpha).
#[inline]
pub fn source_over(src: Pixel, dst: Pixel) -> Pixel {
    let sa = src[3].clamp(0.0, 1.0);
    let da = dst[3].clamp(0.0, 1.0);
    let out_a = da + sa * (1.0 - da);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mix = |s: f32, d: f32| (s * sa + d * da * (1.0 - sa)) / out_a;
    clamp_pixel([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        out_a,
    ])
}

/// Uniform linear blend: `original * (1 - t) + filtered * t`.
///
/// Applied identically to every channel (alpha included) and every pixel.
/// `t` is clamped into `[0, 1]`.
pub fn blend(original: &Image, filtered: &Image, t: f32) -> OperatorResult<Image> {
    if original.extent() != filtered.extent() {
        return Err(OperatorError::ExtentMismatch {
            expected: original.extent(),
            got: filtered.extent(),
        });
    }
    let t = t.clamp(0.0, 1.0);
    let keep = 1.0 - t;
    Ok(original.map_rows(|y, src, dst| {
        let top = filtered.row(y);
        for ((d, o), f) in dst.iter_mut().zip(src).zip(top) {
            *d = [
                o[0] * keep + f[0] * t,
                o[1] * keep + f[1] * t,
                o[2] * keep + f[2] * t,
                o[3] * keep + f[3] * t,
            ];
        }
    }))
}

/// Simulated stray light: a warm radial gradient near one corner.
///
/// The gradient is centered at `center` (fractions of width and height,
/// y pointing down). Inside `inner_radius` pixels it is `inner_color`;
/// between the radii it fades linearly to `outer_color`; beyond
/// `outer_radius` it stays `outer_color`. The gradient is composited over
/// the image with "source over".
#[derive(Debug, Clone, PartialEq)]
pub struct LightLeak {
    /// Center as fractions of width and height
    pub center: (f32, f32),
    /// Radius in pixels of the solid inner disc
    pub inner_radius: f32,
    /// Radius in pixels where the fade ends
    pub outer_radius: f32,
    /// Color inside the inner radius
    pub inner_color: Color,
    /// Color at and beyond the outer radius
    pub outer_color: Color,
}

impl Default for LightLeak {
    fn default() -> Self {
        Self {
            center: (0.9, 0.1),
            inner_radius: 100.0,
            outer_radius: 300.0,
            inner_color: Color::new(1.0, 0.9, 0.7, 0.3),
            outer_color: Color::new(1.0, 0.8, 0.6, 0.0),
        }
    }
}

impl LightLeak {
    /// Gradient color at `distance` pixels from the center.
    pub fn color_at(&self, distance: f32) -> Color {
        let span = self.outer_radius - self.inner_radius;
        let t = if span <= 0.0 {
            if distance <= self.inner_radius { 0.0 } else { 1.0 }
        } else {
            (distance - self.inner_radius) / span
        };
        self.inner_color.lerp(self.outer_color, t)
    }
}

impl Operator for LightLeak {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("light_leak", "Light Leak")
            .category(Category::Composite)
            .description("Overlay a warm radial gradient near a corner")
            .parameter("center_x", self.center.0)
            .parameter("center_y", self.center.1)
            .parameter("inner_radius", self.inner_radius)
            .parameter("outer_radius", self.outer_radius)
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        require_finite("light_leak", "center_x", self.center.0)?;
        require_finite("light_leak", "center_y", self.center.1)?;
        require_finite("light_leak", "inner_radius", self.inner_radius)?;
        require_finite("light_leak", "outer_radius", self.outer_radius)?;
        if self.inner_radius < 0.0 || self.outer_radius < self.inner_radius {
            return Err(OperatorError::invalid(
                "light_leak",
                "outer_radius",
                "radii must satisfy 0 <= inner <= outer",
            ));
        }
        if !self.inner_color.is_normalized() || !self.outer_color.is_normalized() {
            return Err(OperatorError::invalid("light_leak", "color", "channels must lie in [0, 1]"));
        }
        Ok(())
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        let cx = image.width() as f32 * self.center.0;
        let cy = image.height() as f32 * self.center.1;
        Ok(image.map_pixels(|x, y, px| {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let light = self.color_at((dx * dx + dy * dy).sqrt());
            source_over(light.to_pixel(), px)
        }))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_over_opaque_background() {
        let out = source_over([1.0, 1.0, 1.0, 0.25], [0.0, 0.0, 0.0, 1.0]);
        assert!((out[0] - 0.25).abs() < 1e-6);
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn test_source_over_transparent_source() {
        let dst = [0.2, 0.4, 0.6, 1.0];
        assert_eq!(source_over([1.0, 0.0, 0.0, 0.0], dst), dst);
    }

    #[test]
    fn test_blend_midpoint() {
        let a = Image::solid(2, 2, [0.0, 0.2, 1.0, 1.0]);
        let b = Image::solid(2, 2, [1.0, 0.4, 0.0, 1.0]);
        let mid = blend(&a, &b, 0.5).unwrap();
        let px = mid.pixel(1, 0);
        assert!((px[0] - 0.5).abs() < 1e-6);
        assert!((px[1] - 0.3).abs() < 1e-6);
        assert!((px[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_blend_extent_mismatch() {
        let a = Image::new(2, 2);
        let b = Image::new(3, 2);
        assert!(blend(&a, &b, 0.5).is_err());
    }

    #[test]
    fn test_light_leak_warms_corner_only() {
        let img = Image::solid(1000, 1000, [0.2, 0.2, 0.2, 1.0]);
        let out = LightLeak::default().apply(&img).unwrap();
        let corner = out.pixel(900, 100);
        let far = out.pixel(50, 950);
        assert!(corner[0] > 0.4);
        assert!(corner[0] > corner[2]);
        assert_eq!(far, [0.2, 0.2, 0.2, 1.0]);
    }

    #[test]
    fn test_light_leak_gradient() {
        let leak = LightLeak::default();
        assert_eq!(leak.color_at(50.0), leak.inner_color);
        assert_eq!(leak.color_at(400.0), leak.outer_color);
        assert!((leak.color_at(200.0).a - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_light_leak_rejects_inverted_radii() {
        let leak = LightLeak {
            inner_radius: 300.0,
            outer_radius: 100.0,
            ..LightLeak::default()
        };
        assert!(leak.validate().is_err());
    }
}
