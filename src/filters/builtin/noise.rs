//! Digital noise and film grain synthesis.

use crate::core::error::OperatorResult;
use crate::core::operator::{require_non_negative, Category, Operator, OperatorMetadata};
use crate::core::types::Image;
use crate::filters::builtin::composite::source_over;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Film grain is digital noise at this multiple of the requested intensity.
pub const GRAIN_FACTOR: f32 = 1.2;

/// Seed used when none is configured.
pub const DEFAULT_NOISE_SEED: u64 = 0x5EED_CCD0;

/// Uniform monochrome noise composited over the image.
///
/// Every pixel receives a gray value drawn uniformly from `[0, 1)` and is
/// composited with "source over" at alpha = `intensity`. The random stream
/// is derived from `seed` and the row index only, so the same image always
/// receives the same noise no matter how rows are scheduled across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Noise {
    /// Alpha of the noise layer
    pub intensity: f32,
    /// Base seed; each row derives its own generator
    pub seed: u64,
}

impl Noise {
    /// Digital sensor noise.
    pub fn digital(intensity: f32, seed: u64) -> Self {
        Self { intensity, seed }
    }

    /// Film grain: the same operator at [`GRAIN_FACTOR`] times the intensity.
    pub fn grain(intensity: f32, seed: u64) -> Self {
        Self {
            intensity: intensity * GRAIN_FACTOR,
            seed,
        }
    }

    fn row_rng(&self, y: u32) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ (y as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl Operator for Noise {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("noise", "Noise")
            .category(Category::Noise)
            .description("Composite uniform monochrome noise over the image")
            .parameter("intensity", self.intensity)
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        require_non_negative("noise", "intensity", self.intensity)
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        let alpha = self.intensity.min(1.0);
        Ok(image.map_rows(|y, src, dst| {
            let mut rng = self.row_rng(y);
            for (d, s) in dst.iter_mut().zip(src) {
                let n: f32 = rng.gen();
                *d = source_over([n, n, n, alpha], *s);
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

    #[test]
    fn test_grain_factor() {
        let grain = Noise::grain(0.02, 1);
        assert!((grain.intensity - 0.024).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let img = Image::solid(16, 8, [0.5, 0.5, 0.5, 1.0]);
        let op = Noise::digital(0.04, 7);
        assert_eq!(op.apply(&img).unwrap(), op.apply(&img).unwrap());
    }

    #[test]
    fn test_seed_changes_pattern() {
        let img = Image::solid(16, 8, [0.5, 0.5, 0.5, 1.0]);
        let a = Noise::digital(0.5, 1).apply(&img).unwrap();
        let b = Noise::digital(0.5, 2).apply(&img).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_noise_is_bounded_and_monochrome() {
        let img = Image::solid(32, 32, [0.5, 0.2, 0.8, 1.0]);
        let out = Noise::digital(0.04, DEFAULT_NOISE_SEED).apply(&img).unwrap();
        for (a, b) in img.pixels().iter().zip(out.pixels()) {
            for c in 0..3 {
                assert!((a[c] - b[c]).abs() <= 0.04 + 1e-6);
            }
            // Same gray value is mixed into every channel.
            let shift_r = b[0] - a[0] * 0.96;
            let shift_g = b[1] - a[1] * 0.96;
            assert!((shift_r - shift_g).abs() < 1e-5);
            assert_eq!(b[3], 1.0);
        }
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let img = Image::solid(4, 4, [0.3, 0.3, 0.3, 1.0]);
        let out = Noise::digital(0.0, 3).apply(&img).unwrap();
        assert!(out.max_abs_diff(&img).unwrap() < 1e-6);
    }

    #[test]
    fn test_rejects_negative_intensity() {
        assert!(Noise::digital(-0.1, 0).validate().is_err());
    }
}
