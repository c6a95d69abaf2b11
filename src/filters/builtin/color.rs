//! Color adjustment operators: color controls, channel matrices, exposure,
//! white balance and monochrome conversion.

use crate::core::error::{OperatorError, OperatorResult};
use crate::core::operator::{require_finite, require_non_negative, Category, Operator, OperatorMetadata};
use crate::core::types::{clamp_pixel, luminance, Image, LUMA_WEIGHTS};

/// Saturation, brightness and contrast in one pass.
///
/// Saturation mixes each channel with the pixel luminance (0 = grayscale,
/// 1 = original). Brightness is added to every channel. Contrast scales
/// around mid-gray: `(v - 0.5) * contrast + 0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorControls {
    /// Saturation multiplier (1 = unchanged)
    pub saturation: f32,
    /// Added to every channel
    pub brightness: f32,
    /// Contrast multiplier around mid-gray
    pub contrast: f32,
}

impl Default for ColorControls {
    fn default() -> Self {
        Self {
            saturation: 1.0,
            brightness: 0.0,
            contrast: 1.0,
        }
    }
}

impl ColorControls {
    /// Create color controls from explicit values.
    pub fn new(saturation: f32, brightness: f32, contrast: f32) -> Self {
        Self {
            saturation,
            brightness,
            contrast,
        }
    }

    #[inline]
    fn adjust(&self, px: [f32; 4]) -> [f32; 4] {
        let luma = luminance(&px);
        let mut out = px;
        for c in out.iter_mut().take(3) {
            let v = luma + (*c - luma) * self.saturation;
            let v = v + self.brightness;
            *c = (v - 0.5) * self.contrast + 0.5;
        }
        clamp_pixel(out)
    }
}

impl Operator for ColorControls {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("color_controls", "Color Controls")
            .category(Category::Adjust)
            .description("Adjust saturation, brightness and contrast")
            .parameter("saturation", self.saturation)
            .parameter("brightness", self.brightness)
            .parameter("contrast", self.contrast)
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        require_non_negative("color_controls", "saturation", self.saturation)?;
        require_finite("color_controls", "brightness", self.brightness)?;
        require_non_negative("color_controls", "contrast", self.contrast)
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        Ok(image.map_pixels(|_, _, px| self.adjust(px)))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Linear 3×4 channel matrix with bias.
///
/// Each output channel is the dot product of its row with `(r, g, b, a)`
/// plus the bias. Alpha is carried through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMatrix {
    /// Weights of the red output
    pub red: [f32; 4],
    /// Weights of the green output
    pub green: [f32; 4],
    /// Weights of the blue output
    pub blue: [f32; 4],
    /// Added after the matrix
    pub bias: [f32; 3],
}

impl ColorMatrix {
    /// Independent per-channel gains (the diagonal case).
    pub fn gains(r: f32, g: f32, b: f32) -> Self {
        Self {
            red: [r, 0.0, 0.0, 0.0],
            green: [0.0, g, 0.0, 0.0],
            blue: [0.0, 0.0, b, 0.0],
            bias: [0.0; 3],
        }
    }

    /// Full cross-channel mix from three RGB rows.
    pub fn mix(red: [f32; 3], green: [f32; 3], blue: [f32; 3]) -> Self {
        Self {
            red: [red[0], red[1], red[2], 0.0],
            green: [green[0], green[1], green[2], 0.0],
            blue: [blue[0], blue[1], blue[2], 0.0],
            bias: [0.0; 3],
        }
    }

    #[inline]
    fn row(row: &[f32; 4], px: &[f32; 4]) -> f32 {
        row[0] * px[0] + row[1] * px[1] + row[2] * px[2] + row[3] * px[3]
    }
}

impl Operator for ColorMatrix {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("color_matrix", "Color Matrix")
            .category(Category::Color)
            .description("Per-channel gains with optional cross-channel mixing")
            .parameter("rr", self.red[0])
            .parameter("gg", self.green[1])
            .parameter("bb", self.blue[2])
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        let all = self
            .red
            .iter()
            .chain(&self.green)
            .chain(&self.blue)
            .chain(&self.bias);
        for v in all {
            require_finite("color_matrix", "matrix", *v)?;
        }
        Ok(())
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        Ok(image.map_pixels(|_, _, px| {
            clamp_pixel([
                Self::row(&self.red, &px) + self.bias[0],
                Self::row(&self.green, &px) + self.bias[1],
                Self::row(&self.blue, &px) + self.bias[2],
                px[3],
            ])
        }))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Exposure adjustment in stops: RGB scaled by `2^ev`.
#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    /// Stops; negative darkens
    pub ev: f32,
}

impl Operator for Exposure {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("exposure", "Exposure")
            .category(Category::Adjust)
            .description("Scale linear intensity by 2^EV")
            .parameter("ev", self.ev)
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        require_finite("exposure", "ev", self.ev)
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        let gain = self.ev.exp2();
        Ok(image.map_pixels(|_, _, px| clamp_pixel([px[0] * gain, px[1] * gain, px[2] * gain, px[3]])))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// White balance shift from a source neutral to a target neutral.
///
/// Each neutral is a `(temperature in kelvin, tint)` pair. A target cooler
/// than the source in kelvin warms the image. Positive tint shifts towards
/// magenta, negative towards green.
#[derive(Debug, Clone, PartialEq)]
pub struct WhiteBalance {
    /// Source white point as (kelvin, tint)
    pub neutral: (f32, f32),
    /// Target white point as (kelvin, tint)
    pub target: (f32, f32),
}

/// Green attenuation per unit of tint.
const TINT_SCALE: f32 = 0.0025;

impl WhiteBalance {
    /// Per-channel gains, normalized to unit luminance.
    pub fn gains(&self) -> [f32; 3] {
        let src = kelvin_to_rgb(self.neutral.0);
        let dst = kelvin_to_rgb(self.target.0);
        let mut gains = [dst[0] / src[0], dst[1] / src[1], dst[2] / src[2]];

        let tint = self.target.1 - self.neutral.1;
        gains[1] *= (1.0 - tint * TINT_SCALE).max(0.0);

        let norm = gains[0] * LUMA_WEIGHTS[0] + gains[1] * LUMA_WEIGHTS[1] + gains[2] * LUMA_WEIGHTS[2];
        if norm > f32::EPSILON {
            gains.iter_mut().for_each(|g| *g /= norm);
        }
        gains
    }
}

impl Operator for WhiteBalance {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("white_balance", "White Balance")
            .category(Category::Color)
            .description("Shift the white point between two color temperatures")
            .parameter("neutral_temperature", self.neutral.0)
            .parameter("neutral_tint", self.neutral.1)
            .parameter("target_temperature", self.target.0)
            .parameter("target_tint", self.target.1)
            .build()
    }

    fn validate(&self) -> OperatorResult<()> {
        for (name, kelvin) in [("neutral_temperature", self.neutral.0), ("target_temperature", self.target.0)] {
            require_finite("white_balance", name, kelvin)?;
            if !(1000.0..=40000.0).contains(&kelvin) {
                return Err(OperatorError::invalid(
                    "white_balance",
                    name,
                    format!("{}K is outside 1000K..40000K", kelvin),
                ));
            }
        }
        require_finite("white_balance", "neutral_tint", self.neutral.1)?;
        require_finite("white_balance", "target_tint", self.target.1)
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        let [r, g, b] = self.gains();
        Ok(image.map_pixels(|_, _, px| clamp_pixel([px[0] * r, px[1] * g, px[2] * b, px[3]])))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

/// Approximate normalized RGB of a black-body radiator.
///
/// Curve fit by Tanner Helland, valid from 1000K to 40000K.
pub fn kelvin_to_rgb(kelvin: f32) -> [f32; 3] {
    let t = kelvin.clamp(1000.0, 40000.0) / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_73 * (t - 60.0).powf(-0.133_204_76)
    };

    let g = if t <= 66.0 {
        99.470_8 * t.ln() - 161.119_57
    } else {
        288.122_16 * (t - 60.0).powf(-0.075_514_85)
    };

    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_73 * (t - 10.0).ln() - 305.044_8
    };

    // Keep a floor so gains stay finite when dividing.
    [r, g, b].map(|c| (c / 255.0).clamp(0.01, 1.0))
}

/// Converts an image to monochrome using Rec. 709 luminance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Monochrome;

impl Operator for Monochrome {
    fn metadata(&self) -> OperatorMetadata {
        OperatorMetadata::builder("monochrome", "Monochrome")
            .category(Category::Color)
            .description("Replace color with luminance")
            .build()
    }

    fn process(&self, image: &Image) -> OperatorResult<Image> {
        Ok(image.map_pixels(|_, _, px| {
            let luma = luminance(&px).clamp(0.0, 1.0);
            [luma, luma, luma, px[3]]
        }))
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(v: f32) -> Image {
        Image::solid(2, 2, [v, v, v, 1.0])
    }

    #[test]
    fn test_color_controls_on_gray() {
        let op = ColorControls::new(0.9, 0.02, 1.05);
        let out = op.apply(&gray(0.5)).unwrap();
        let expected = (0.52 - 0.5) * 1.05 + 0.5;
        for c in 0..3 {
            assert!((out.pixel(0, 0)[c] - expected).abs() < 1e-6);
        }
        assert_eq!(out.pixel(0, 0)[3], 1.0);
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        let op = ColorControls::new(0.0, 0.0, 1.0);
        let img = Image::solid(1, 1, [0.9, 0.2, 0.1, 1.0]);
        let px = op.apply(&img).unwrap().pixel(0, 0);
        assert!((px[0] - px[1]).abs() < 1e-6);
        assert!((px[1] - px[2]).abs() < 1e-6);
    }

    #[test]
    fn test_color_controls_rejects_negative_contrast() {
        let op = ColorControls::new(1.0, 0.0, -1.0);
        assert!(op.apply(&gray(0.5)).is_err());
    }

    #[test]
    fn test_gain_matrix() {
        let op = ColorMatrix::gains(1.05, 1.08, 0.95);
        let px = op.apply(&gray(0.5)).unwrap().pixel(1, 1);
        assert!((px[0] - 0.525).abs() < 1e-6);
        assert!((px[1] - 0.54).abs() < 1e-6);
        assert!((px[2] - 0.475).abs() < 1e-6);
    }

    #[test]
    fn test_cross_mix_matrix() {
        let op = ColorMatrix::mix([1.2, 0.0, 0.3], [0.0, 0.8, 0.2], [0.2, 0.0, 1.5]);
        let img = Image::solid(1, 1, [0.0, 0.0, 0.4, 1.0]);
        let px = op.apply(&img).unwrap().pixel(0, 0);
        assert!((px[0] - 0.12).abs() < 1e-6);
        assert!((px[1] - 0.08).abs() < 1e-6);
        assert!((px[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_matrix_rejects_nan() {
        let op = ColorMatrix::gains(f32::NAN, 1.0, 1.0);
        assert!(op.apply(&gray(0.5)).is_err());
    }

    #[test]
    fn test_exposure_halves() {
        let op = Exposure { ev: -1.0 };
        let px = op.apply(&gray(0.8)).unwrap().pixel(0, 0);
        assert!((px[0] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_white_balance_warm_and_cool() {
        let warm = WhiteBalance {
            neutral: (6800.0, 0.0),
            target: (5500.0, 10.0),
        }
        .gains();
        assert!(warm[0] > warm[2]);

        let cool = WhiteBalance {
            neutral: (6500.0, 0.0),
            target: (7500.0, -10.0),
        }
        .gains();
        assert!(cool[2] > cool[0]);
    }

    #[test]
    fn test_white_balance_identity() {
        let gains = WhiteBalance {
            neutral: (6500.0, 0.0),
            target: (6500.0, 0.0),
        }
        .gains();
        for g in gains {
            assert!((g - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_white_balance_rejects_out_of_range() {
        let op = WhiteBalance {
            neutral: (100.0, 0.0),
            target: (6500.0, 0.0),
        };
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_monochrome() {
        let img = Image::solid(1, 1, [1.0, 0.0, 0.0, 0.5]);
        let px = Monochrome.apply(&img).unwrap().pixel(0, 0);
        assert!((px[0] - LUMA_WEIGHTS[0]).abs() < 1e-6);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        assert_eq!(px[3], 0.5);
    }
}
