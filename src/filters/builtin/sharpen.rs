//! Luminance sharpening.

use crate::core::error::OperatorResult;
use crate::core::operator::{require_non_negative, Category, Operator, OperatorMetadata};
use crate::core::types::{clamp_pixel, luminance, Image};
use image::{ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;

/// Unsharp mask applied to luminance only.
///
/// The luminance of each pixel is compared with the mean luminance of its
/// 3×3 neighborhood (edges clamp to the border); `sharpness` times the
/// difference is added to every color channel. The neighborhood mean comes
/// from `imageproc`'s separable filter on an `f32` luminance plane.
#[derive(Debug, Clone, PartialEq)]
pub struct SharpenLuminance {
    /// Strength of the luminance detail boost
    pub sharpness: f32,
}

impl Operator for SharpenLuminance {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("sharpen_luminance", "Sharpen Luminance")
            .category(Category::Sharpen)
            .description("Increase local luminance contrast")
            .parameter("sharpness", self.sharpness)
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        require_non_negative("sharpen_luminance", "sharpness", self.sharpness)
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        let luma: ImageBuffer<Luma<f32>, Vec<f32>> =
            ImageBuffer::from_fn(image.width(), image.height(), |x, y| Luma([luminance(&image.pixel(x, y))]));
        // 3x3 box mean; imageproc clamps reads at the border.
        let blurred = separable_filter_equal(&luma, &[1.0f32 / 3.0; 3]);

        Ok(image.map_pixels(|x, y, px| {
            let delta = (luma.get_pixel(x, y)[0] - blurred.get_pixel(x, y)[0]) * self.sharpness;
            clamp_pixel([px[0] + delta, px[1] + delta, px[2] + delta, px[3]])
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
    fn test_flat_image_unchanged() {
        let img = Image::solid(4, 4, [0.4, 0.5, 0.6, 1.0]);
        let out = SharpenLuminance { sharpness: 0.4 }.apply(&img).unwrap();
        assert!(out.max_abs_diff(&img).unwrap() < 1e-6);
    }

    #[test]
    fn test_bright_dot_gets_brighter() {
        let img = Image::from_fn(3, 3, |x, y| {
            if x == 1 && y == 1 {
                [0.6, 0.6, 0.6, 1.0]
            } else {
                [0.4, 0.4, 0.4, 1.0]
            }
        });
        let out = SharpenLuminance { sharpness: 0.4 }.apply(&img).unwrap();
        assert!(out.pixel(1, 1)[0] > 0.6);
        assert!(out.pixel(0, 0)[0] <= 0.4);
    }

    #[test]
    fn test_matches_direct_box_mean() {
        let img = Image::from_fn(5, 4, |x, y| {
            let v = ((x * 7 + y * 3) % 5) as f32 / 5.0;
            [v, 0.5 * v, 0.25, 1.0]
        });
        let sharpness = 0.7;
        let out = SharpenLuminance { sharpness }.apply(&img).unwrap();

        let (w, h) = (img.width() as i64, img.height() as i64);
        let at = |x: i64, y: i64| luminance(&img.pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32));
        for y in 0..h {
            for x in 0..w {
                let mean: f32 = (-1..=1)
                    .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
                    .map(|(dx, dy)| at(x + dx, y + dy))
                    .sum::<f32>()
                    / 9.0;
                let src = img.pixel(x as u32, y as u32);
                let expected = (src[0] + (at(x, y) - mean) * sharpness).clamp(0.0, 1.0);
                let got = out.pixel(x as u32, y as u32)[0];
                assert!((got - expected).abs() < 1e-4, "({x}, {y}): {got} vs {expected}");
            }
        }
    }

    #[test]
    fn test_single_pixel_image() {
        let img = Image::solid(1, 1, [0.5, 0.5, 0.5, 1.0]);
        let out = SharpenLuminance { sharpness: 1.0 }.apply(&img).unwrap();
        assert_eq!(out.extent(), img.extent());
    }
}
