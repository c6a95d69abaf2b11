//! Core value types that flow through the filter pipeline.
//!
//! [`Image`] is the only data type an operator sees. It is an immutable,
//! reference-counted buffer of normalized RGBA samples, so handing the same
//! image to several stages (the original and the filtered branch of an
//! intensity blend, for example) never copies pixel data.

use image::{DynamicImage, Rgba, Rgba32FImage, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One RGBA sample, each channel in `[0, 1]`.
pub type Pixel = [f32; 4];

/// Rec. 709 luminance weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Number of pixels above which per-row work is spread over the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Luminance of an RGB triple.
#[inline]
pub fn luminance(px: &Pixel) -> f32 {
    px[0] * LUMA_WEIGHTS[0] + px[1] * LUMA_WEIGHTS[1] + px[2] * LUMA_WEIGHTS[2]
}

/// Clamp every channel of a pixel into `[0, 1]`.
#[inline]
pub fn clamp_pixel(px: Pixel) -> Pixel {
    [
        px[0].clamp(0.0, 1.0),
        px[1].clamp(0.0, 1.0),
        px[2].clamp(0.0, 1.0),
        px[3].clamp(0.0, 1.0),
    ]
}

/// Width and height of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent {
    /// Create an extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// An extent with no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// RGBA color with normalized channels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha (defaults to opaque)
    #[serde(default = "Color::opaque")]
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    /// Fully transparent.
    pub const CLEAR: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    /// Create a new color from RGBA components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from RGB components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    fn opaque() -> f32 {
        1.0
    }

    /// The color as a pixel.
    pub fn to_pixel(self) -> Pixel {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear interpolation towards `other`, `t` in `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let keep = 1.0 - t;
        Color::new(
            self.r * keep + other.r * t,
            self.g * keep + other.g * t,
            self.b * keep + other.b * t,
            self.a * keep + other.a * t,
        )
    }

    /// Whether all channels are finite and inside `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        [self.r, self.g, self.b, self.a]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

/// Immutable RGBA image with `f32` samples in `[0, 1]`.
///
/// Cloning shares the pixel storage. Operators always build a fresh image
/// through [`Image::from_fn`], [`Image::map_pixels`] or [`Image::map_rows`].
#[derive(Clone)]
pub struct Image {
    extent: Extent,
    pixels: Arc<Vec<Pixel>>,
}

impl Image {
    /// Create a fully transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::solid(width, height, [0.0; 4])
    }

    /// Create an image filled with one pixel value.
    pub fn solid(width: u32, height: u32, pixel: Pixel) -> Self {
        let extent = Extent::new(width, height);
        Self {
            extent,
            pixels: Arc::new(vec![pixel; extent.pixel_count()]),
        }
    }

    /// Create an image by evaluating `f` at every coordinate.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> Pixel + Sync,
    {
        Self::solid(width, height, [0.0; 4]).map_pixels(|x, y, _| f(x, y))
    }

    /// Convert a decoded image into normalized floating-point samples.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::from_rgba32f(&image.to_rgba32f())
    }

    /// Wrap an `image` crate float buffer.
    pub fn from_rgba32f(buffer: &Rgba32FImage) -> Self {
        let extent = Extent::new(buffer.width(), buffer.height());
        let pixels = buffer.pixels().map(|p| clamp_pixel(p.0)).collect();
        Self {
            extent,
            pixels: Arc::new(pixels),
        }
    }

    /// Convert to an 8-bit RGBA buffer for encoding or display.
    pub fn to_rgba8(&self) -> RgbaImage {
        RgbaImage::from_fn(self.extent.width, self.extent.height, |x, y| {
            let px = self.pixel(x, y);
            Rgba([
                to_u8(px[0]),
                to_u8(px[1]),
                to_u8(px[2]),
                to_u8(px[3]),
            ])
        })
    }

    /// Convert to a floating-point `image` crate buffer.
    pub fn to_rgba32f(&self) -> Rgba32FImage {
        Rgba32FImage::from_fn(self.extent.width, self.extent.height, |x, y| {
            Rgba(self.pixel(x, y))
        })
    }

    /// Convert to an 8-bit `DynamicImage`.
    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.to_rgba8())
    }

    /// Image width.
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    /// Image height.
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    /// Image extent.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.extent.is_empty()
    }

    /// Pixel at `(x, y)`. Coordinates are clamped to the image bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Pixel {
        let x = x.min(self.extent.width.saturating_sub(1));
        let y = y.min(self.extent.height.saturating_sub(1));
        self.pixels[y as usize * self.extent.width as usize + x as usize]
    }

    /// Row-major view of all pixels.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// One row of pixels.
    pub fn row(&self, y: u32) -> &[Pixel] {
        let w = self.extent.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    /// Build a new image of the same extent row by row.
    ///
    /// `f` receives the row index, the source row and the destination row.
    /// Large images are processed on the rayon pool; every row is written
    /// by exactly one call, so results never depend on scheduling.
    pub fn map_rows<F>(&self, f: F) -> Image
    where
        F: Fn(u32, &[Pixel], &mut [Pixel]) + Sync,
    {
        let w = self.extent.width as usize;
        let mut out = vec![[0.0f32; 4]; self.pixels.len()];

        if w > 0 {
            if self.pixels.len() >= PARALLEL_THRESHOLD {
                out.par_chunks_mut(w)
                    .zip(self.pixels.par_chunks(w))
                    .enumerate()
                    .for_each(|(y, (dst, src))| f(y as u32, src, dst));
            } else {
                out.chunks_mut(w)
                    .zip(self.pixels.chunks(w))
                    .enumerate()
                    .for_each(|(y, (dst, src))| f(y as u32, src, dst));
            }
        }

        Image {
            extent: self.extent,
            pixels: Arc::new(out),
        }
    }

    /// Build a new image by mapping every pixel.
    pub fn map_pixels<F>(&self, f: F) -> Image
    where
        F: Fn(u32, u32, Pixel) -> Pixel + Sync,
    {
        self.map_rows(|y, src, dst| {
            for (x, (d, s)) in dst.iter_mut().zip(src).enumerate() {
                *d = f(x as u32, y, *s);
            }
        })
    }

    /// Mean of each channel over the whole image.
    pub fn channel_means(&self) -> Pixel {
        let n = self.pixels.len();
        if n == 0 {
            return [0.0; 4];
        }
        let mut sum = [0.0f64; 4];
        for px in self.pixels.iter() {
            for c in 0..4 {
                sum[c] += px[c] as f64;
            }
        }
        sum.map(|s| (s / n as f64) as f32)
    }

    /// Mean absolute per-channel difference to another image of the same extent.
    ///
    /// Returns `None` when the extents differ.
    pub fn mean_abs_diff(&self, other: &Image) -> Option<f32> {
        if self.extent != other.extent {
            return None;
        }
        if self.pixels.is_empty() {
            return Some(0.0);
        }
        let total: f64 = self
            .pixels
            .iter()
            .zip(other.pixels.iter())
            .map(|(a, b)| (0..4).map(|c| (a[c] - b[c]).abs() as f64).sum::<f64>())
            .sum();
        Some((total / (self.pixels.len() * 4) as f64) as f32)
    }

    /// Largest per-channel difference to another image of the same extent.
    pub fn max_abs_diff(&self, other: &Image) -> Option<f32> {
        if self.extent != other.extent {
            return None;
        }
        Some(
            self.pixels
                .iter()
                .zip(other.pixels.iter())
                .flat_map(|(a, b)| (0..4).map(move |c| (a[c] - b[c]).abs()))
                .fold(0.0f32, f32::max),
        )
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.extent == other.extent
            && (Arc::ptr_eq(&self.pixels, &other.pixels) || self.pixels == other.pixels)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("extent", &self.extent)
            .finish_non_exhaustive()
    }
}

impl From<&DynamicImage> for Image {
    fn from(image: &DynamicImage) -> Self {
        Image::from_dynamic(image)
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_empty() {
        assert!(Extent::new(0, 10).is_empty());
        assert!(Extent::new(10, 0).is_empty());
        assert!(!Extent::new(1, 1).is_empty());
        assert_eq!(Extent::new(3, 4).pixel_count(), 12);
    }

    #[test]
    fn test_from_fn_layout() {
        let img = Image::from_fn(3, 2, |x, y| [x as f32 / 2.0, y as f32, 0.0, 1.0]);
        assert_eq!(img.extent(), Extent::new(3, 2));
        assert_eq!(img.pixel(2, 1), [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(img.row(1)[0], [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_map_does_not_touch_source() {
        let src = Image::solid(4, 4, [0.5, 0.5, 0.5, 1.0]);
        let dst = src.map_pixels(|_, _, p| [p[0] * 0.5, p[1], p[2], p[3]]);
        assert_eq!(src.pixel(0, 0)[0], 0.5);
        assert_eq!(dst.pixel(0, 0)[0], 0.25);
    }

    #[test]
    fn test_large_image_parallel_matches_sequential_layout() {
        let img = Image::from_fn(512, 200, |x, y| [(x % 7) as f32 / 7.0, (y % 5) as f32 / 5.0, 0.0, 1.0]);
        assert!(img.pixels().len() >= PARALLEL_THRESHOLD);
        assert_eq!(img.pixel(13, 11), [6.0 / 7.0, 1.0 / 5.0, 0.0, 1.0]);
    }

    #[test]
    fn test_dynamic_round_trip_keeps_extent() {
        let img = Image::solid(5, 3, [1.0, 0.0, 0.0, 1.0]);
        let back = Image::from_dynamic(&img.to_dynamic());
        assert_eq!(back.extent(), img.extent());
        assert_eq!(back.pixel(4, 2), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_channel_means_and_diff() {
        let a = Image::solid(2, 2, [0.2, 0.4, 0.6, 1.0]);
        let b = Image::solid(2, 2, [0.3, 0.4, 0.6, 1.0]);
        let means = a.channel_means();
        assert!((means[1] - 0.4).abs() < 1e-6);
        assert!((a.max_abs_diff(&b).unwrap() - 0.1).abs() < 1e-6);
        assert!(a.mean_abs_diff(&Image::new(1, 1)).is_none());
    }

    #[test]
    fn test_color_lerp() {
        let c = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert_eq!(c, Color::rgb(0.5, 0.5, 0.5));
        assert!(Color::CLEAR.is_normalized());
        assert!(!Color::rgb(1.5, 0.0, 0.0).is_normalized());
    }

    #[test]
    fn test_luminance_of_white_is_one() {
        assert!((luminance(&[1.0, 1.0, 1.0, 1.0]) - 1.0).abs() < 1e-6);
    }
}
