//! Photo frames: colored borders, rounded corners and film-strip holes.
//!
//! Framing grows the image, so it is not an [`Operator`](crate::core::Operator)
//! and never runs inside a style chain. Apply it to the output of the
//! filter pipeline.

use crate::core::error::{OperatorError, OperatorResult, RetroError};
use crate::core::types::{Color, Image};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FrameStyle {
    /// No frame
    #[default]
    None,
    /// White instant-film border with a wide bottom strip
    Polaroid,
    /// Cream instant-film border
    PolaroidVintage,
    /// Black border with sprocket holes
    FilmStrip,
    /// Narrow instant-film border
    Instant,
    /// Even white border
    ClassicWhite,
    /// Even black border
    ClassicBlack,
    /// Cyan border with round corners
    Retro90s,
}

/// Border geometry and color of a frame, in pixels at scale 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    /// Top border
    pub top: f32,
    /// Left and right borders
    pub side: f32,
    /// Bottom border
    pub bottom: f32,
    /// Outer corner radius
    pub corner_radius: f32,
    /// Border color
    pub color: Color,
}

/// Largest width or height of a framed image.
pub const MAX_FRAMED_SIDE: u32 = 1 << 16;

/// Largest pixel count of a framed image.
pub const MAX_FRAMED_PIXELS: u64 = 1 << 28;

/// Sprocket hole layout of the film-strip frame.
const HOLE_COUNT: u32 = 8;
const HOLE_WIDTH: f32 = 20.0;
const HOLE_HEIGHT: f32 = 10.0;
const HOLE_SPACING: f32 = 15.0;
const HOLE_MARGIN: f32 = 10.0;

impl FrameStyle {
    /// All frames in display order.
    pub const ALL: [FrameStyle; 8] = [
        FrameStyle::None,
        FrameStyle::Polaroid,
        FrameStyle::PolaroidVintage,
        FrameStyle::FilmStrip,
        FrameStyle::Instant,
        FrameStyle::ClassicWhite,
        FrameStyle::ClassicBlack,
        FrameStyle::Retro90s,
    ];

    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        match self {
            FrameStyle::None => "none",
            FrameStyle::Polaroid => "polaroid",
            FrameStyle::PolaroidVintage => "polaroid-vintage",
            FrameStyle::FilmStrip => "film-strip",
            FrameStyle::Instant => "instant",
            FrameStyle::ClassicWhite => "classic-white",
            FrameStyle::ClassicBlack => "classic-black",
            FrameStyle::Retro90s => "retro-90s",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            FrameStyle::None => "No Frame",
            FrameStyle::Polaroid => "Polaroid",
            FrameStyle::PolaroidVintage => "Vintage Polaroid",
            FrameStyle::FilmStrip => "Film Strip",
            FrameStyle::Instant => "Instant",
            FrameStyle::ClassicWhite => "Classic White",
            FrameStyle::ClassicBlack => "Classic Black",
            FrameStyle::Retro90s => "90s",
        }
    }

    /// Whether the frame is part of the paid set.
    pub fn is_premium(&self) -> bool {
        !matches!(self, FrameStyle::None | FrameStyle::Polaroid | FrameStyle::ClassicWhite)
    }

    /// Border geometry.
    pub fn params(&self) -> FrameParams {
        let p = |top, side, bottom, corner_radius, color| FrameParams {
            top,
            side,
            bottom,
            corner_radius,
            color,
        };
        match self {
            FrameStyle::None => p(0.0, 0.0, 0.0, 0.0, Color::CLEAR),
            FrameStyle::Polaroid => p(40.0, 40.0, 120.0, 8.0, Color::WHITE),
            FrameStyle::PolaroidVintage => p(50.0, 45.0, 140.0, 12.0, Color::rgb(0.98, 0.96, 0.92)),
            FrameStyle::FilmStrip => p(60.0, 20.0, 60.0, 4.0, Color::BLACK),
            FrameStyle::Instant => p(30.0, 30.0, 100.0, 6.0, Color::WHITE),
            FrameStyle::ClassicWhite => p(80.0, 80.0, 80.0, 0.0, Color::WHITE),
            FrameStyle::ClassicBlack => p(80.0, 80.0, 80.0, 0.0, Color::BLACK),
            FrameStyle::Retro90s => p(20.0, 20.0, 20.0, 15.0, Color::rgb(0.2, 0.8, 0.9)),
        }
    }
}

impl fmt::Display for FrameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FrameStyle {
    type Err = RetroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        FrameStyle::ALL
            .into_iter()
            .find(|f| f.id() == normalized)
            .ok_or_else(|| RetroError::UnknownFrame(s.to_string()))
    }
}

/// Surround `image` with a frame.
///
/// `scale` multiplies every frame dimension (1.0 = the nominal pixel
/// sizes). The photo is copied unchanged into the padded area; pixels
/// outside the rounded outline are fully transparent. `FrameStyle::None`
/// and empty images are returned as-is. Non-finite or non-positive scales
/// count as 1.0; a scale whose framed image would exceed
/// [`MAX_FRAMED_SIDE`] or [`MAX_FRAMED_PIXELS`] is rejected.
pub fn apply_frame(image: &Image, frame: FrameStyle, scale: f32) -> OperatorResult<Image> {
    if frame == FrameStyle::None || image.is_empty() {
        return Ok(image.clone());
    }
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let params = frame.params();

    let too_large = || {
        OperatorError::invalid(
            "frame",
            "scale",
            format!("{} frame at scale {} makes the image too large", frame, scale),
        )
    };
    let padding = |size: f32| -> OperatorResult<u32> {
        let px = (size * scale).round();
        if px > MAX_FRAMED_SIDE as f32 {
            return Err(too_large());
        }
        Ok(px as u32)
    };
    let top = padding(params.top)?;
    let side = padding(params.side)?;
    let bottom = padding(params.bottom)?;
    let width = side
        .checked_mul(2)
        .and_then(|s| s.checked_add(image.width()))
        .filter(|w| *w <= MAX_FRAMED_SIDE)
        .ok_or_else(too_large)?;
    let height = top
        .checked_add(bottom)
        .and_then(|s| s.checked_add(image.height()))
        .filter(|h| *h <= MAX_FRAMED_SIDE)
        .ok_or_else(too_large)?;
    if width as u64 * height as u64 > MAX_FRAMED_PIXELS {
        return Err(too_large());
    }

    let radius = params.corner_radius * scale;
    let border = params.color.to_pixel();
    let film_holes = frame == FrameStyle::FilmStrip;

    log::debug!(
        "framing {} image with '{}' -> {}x{}",
        image.extent(),
        frame,
        width,
        height
    );

    Ok(Image::from_fn(width, height, |x, y| {
        if !inside_rounded_rect(x, y, width, height, radius) {
            return [0.0; 4];
        }
        let in_photo = x >= side && x < side + image.width() && y >= top && y < top + image.height();
        if in_photo {
            return image.pixel(x - side, y - top);
        }
        if film_holes && in_sprocket_hole(x, y, width, height, scale) {
            return Color::WHITE.to_pixel();
        }
        border
    }))
}

fn inside_rounded_rect(x: u32, y: u32, width: u32, height: u32, radius: f32) -> bool {
    if radius <= 0.0 {
        return true;
    }
    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;
    let w = width as f32;
    let h = height as f32;
    let r = radius.min(w / 2.0).min(h / 2.0);
    let cx = px.clamp(r, w - r);
    let cy = py.clamp(r, h - r);
    let (dx, dy) = (px - cx, py - cy);
    dx * dx + dy * dy <= r * r
}

fn in_sprocket_hole(x: u32, y: u32, width: u32, height: u32, scale: f32) -> bool {
    let hole_w = HOLE_WIDTH * scale;
    let hole_h = HOLE_HEIGHT * scale;
    let spacing = HOLE_SPACING * scale;
    let margin = HOLE_MARGIN * scale;
    let row_width = HOLE_COUNT as f32 * hole_w + (HOLE_COUNT - 1) as f32 * spacing;
    let start = (width as f32 - row_width) / 2.0;

    let px = x as f32 + 0.5;
    let py = y as f32 + 0.5;
    let top_row = py >= margin && py < margin + hole_h;
    let bottom_row = py >= height as f32 - margin - hole_h && py < height as f32 - margin;
    if !(top_row || bottom_row) || px < start || px >= start + row_width {
        return false;
    }
    let offset = (px - start) % (hole_w + spacing);
    offset < hole_w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Pixel;

    fn border_pixel(frame: FrameStyle) -> Pixel {
        frame.params().color.to_pixel()
    }

    fn photo() -> Image {
        Image::solid(100, 80, [0.5, 0.25, 0.75, 1.0])
    }

    #[test]
    fn test_polaroid_extent() {
        let framed = apply_frame(&photo(), FrameStyle::Polaroid, 1.0).unwrap();
        assert_eq!(framed.width(), 180);
        assert_eq!(framed.height(), 240);
    }

    #[test]
    fn test_photo_copied_into_frame() {
        let framed = apply_frame(&photo(), FrameStyle::ClassicBlack, 0.5).unwrap();
        assert_eq!(framed.pixel(40, 40), [0.5, 0.25, 0.75, 1.0]);
        assert_eq!(framed.pixel(10, 10), border_pixel(FrameStyle::ClassicBlack));
    }

    #[test]
    fn test_rounded_corner_is_transparent() {
        let framed = apply_frame(&photo(), FrameStyle::Retro90s, 1.0).unwrap();
        assert_eq!(framed.pixel(0, 0)[3], 0.0);
        assert_eq!(framed.pixel(20, 0), border_pixel(FrameStyle::Retro90s));
    }

    #[test]
    fn test_film_strip_has_holes() {
        let framed = apply_frame(&Image::solid(300, 100, [0.0, 0.0, 0.0, 1.0]), FrameStyle::FilmStrip, 1.0).unwrap();
        let white = framed
            .pixels()
            .iter()
            .filter(|p| **p == Color::WHITE.to_pixel())
            .count();
        // 16 holes of 20x10 pixels.
        assert_eq!(white, 16 * 200);
    }

    #[test]
    fn test_none_is_identity() {
        let img = photo();
        assert_eq!(apply_frame(&img, FrameStyle::None, 1.0).unwrap(), img);
    }

    #[test]
    fn test_huge_scale_is_rejected() {
        let img = Image::solid(4, 4, [0.5, 0.5, 0.5, 1.0]);
        for scale in [1.0e9, 3.0e9, f32::MAX] {
            let result = apply_frame(&img, FrameStyle::Polaroid, scale);
            assert!(
                matches!(result, Err(OperatorError::InvalidParameter { ref parameter, .. }) if parameter == "scale"),
                "scale {scale} gave {result:?}"
            );
        }
        // Fits each side limit but not the pixel budget.
        assert!(apply_frame(&img, FrameStyle::ClassicWhite, 400.0).is_err());
    }

    #[test]
    fn test_invalid_scale_counts_as_one() {
        let img = photo();
        let nominal = apply_frame(&img, FrameStyle::Instant, 1.0).unwrap();
        for scale in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            assert_eq!(apply_frame(&img, FrameStyle::Instant, scale).unwrap(), nominal);
        }
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!("film_strip".parse::<FrameStyle>().unwrap(), FrameStyle::FilmStrip);
        assert_eq!("Polaroid-Vintage".parse::<FrameStyle>().unwrap(), FrameStyle::PolaroidVintage);
        assert!("passepartout".parse::<FrameStyle>().is_err());
        assert!(!FrameStyle::Polaroid.is_premium());
        assert!(FrameStyle::FilmStrip.is_premium());
    }
}
