//! Text watermarks stamped onto the filtered photo.
//!
//! Text is drawn with a built-in 5×7 bitmap font, so rendering is identical
//! on every machine and needs no font files. Lowercase letters are drawn as
//! capitals; characters without a glyph are drawn as `?`.

use crate::core::error::RetroError;
use crate::core::types::{Color, Image};
use crate::filters::builtin::composite::source_over;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Glyph cell width in font pixels, without the spacing column.
const GLYPH_WIDTH: i64 = 5;
/// Glyph cell height in font pixels.
const GLYPH_ROWS: i64 = 7;
/// Horizontal advance per character in font pixels.
const GLYPH_ADVANCE: i64 = GLYPH_WIDTH + 1;
/// Distance between the text and the photo edge at scale 1.0.
const WATERMARK_MARGIN: f32 = 10.0;

/// Available watermarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkType {
    /// No watermark
    #[default]
    None,
    /// Capture date and time
    Timestamp,
    /// Fixed camera brand line
    CcdBrand,
    /// `'90s` with month and day
    Vintage,
    /// `FILM` with the date
    FilmDate,
    /// Caller-provided text
    CustomText,
}

/// Where the watermark sits on the photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    /// Top left corner
    TopLeft,
    /// Top right corner
    TopRight,
    /// Bottom left corner
    BottomLeft,
    /// Bottom right corner
    BottomRight,
    /// Centered along the bottom edge
    BottomCenter,
}

/// Size, color and placement of a watermark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkStyle {
    /// Text height in pixels at scale 1.0
    pub size: f32,
    /// Text color
    pub color: Color,
    /// Anchor on the photo
    pub position: WatermarkPosition,
}

impl WatermarkType {
    /// All watermarks in display order.
    pub const ALL: [WatermarkType; 6] = [
        WatermarkType::None,
        WatermarkType::Timestamp,
        WatermarkType::CcdBrand,
        WatermarkType::Vintage,
        WatermarkType::FilmDate,
        WatermarkType::CustomText,
    ];

    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        match self {
            WatermarkType::None => "none",
            WatermarkType::Timestamp => "timestamp",
            WatermarkType::CcdBrand => "ccd-brand",
            WatermarkType::Vintage => "vintage",
            WatermarkType::FilmDate => "film-date",
            WatermarkType::CustomText => "custom-text",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            WatermarkType::None => "No Watermark",
            WatermarkType::Timestamp => "Timestamp",
            WatermarkType::CcdBrand => "CCD Brand",
            WatermarkType::Vintage => "Vintage Mark",
            WatermarkType::FilmDate => "Film Date",
            WatermarkType::CustomText => "Custom Text",
        }
    }

    /// Whether the watermark is part of the paid set.
    pub fn is_premium(&self) -> bool {
        !matches!(self, WatermarkType::None | WatermarkType::Timestamp | WatermarkType::CcdBrand)
    }

    /// The text stamped at `when`. An empty `custom` text falls back to
    /// `"Custom Text"`.
    pub fn text_at(&self, custom: &str, when: NaiveDateTime) -> String {
        match self {
            WatermarkType::None => String::new(),
            WatermarkType::Timestamp => when.format("%Y.%m.%d %H:%M").to_string(),
            WatermarkType::CcdBrand => "CCD FILM CAMERA".to_string(),
            WatermarkType::Vintage => when.format("'90s %m.%d").to_string(),
            WatermarkType::FilmDate => when.format("FILM %Y/%m/%d").to_string(),
            WatermarkType::CustomText if custom.trim().is_empty() => "Custom Text".to_string(),
            WatermarkType::CustomText => custom.to_string(),
        }
    }

    /// The text stamped now, in local time.
    pub fn text(&self, custom: &str) -> String {
        self.text_at(custom, Local::now().naive_local())
    }

    /// Size, color and placement.
    pub fn style(&self) -> WatermarkStyle {
        let s = |size, color, position| WatermarkStyle { size, color, position };
        let yellow = Color::rgb(1.0, 0.8, 0.0);
        let orange = Color::rgb(1.0, 0.58, 0.0);
        match self {
            WatermarkType::None => s(12.0, Color::CLEAR, WatermarkPosition::BottomRight),
            WatermarkType::Timestamp => s(12.0, Color::WHITE, WatermarkPosition::BottomRight),
            WatermarkType::CcdBrand => s(11.0, yellow, WatermarkPosition::BottomLeft),
            WatermarkType::Vintage => s(12.0, orange, WatermarkPosition::TopRight),
            WatermarkType::FilmDate => s(11.0, Color::WHITE, WatermarkPosition::BottomCenter),
            WatermarkType::CustomText => s(12.0, Color::WHITE, WatermarkPosition::BottomRight),
        }
    }
}

impl fmt::Display for WatermarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for WatermarkType {
    type Err = RetroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        WatermarkType::ALL
            .into_iter()
            .find(|w| w.id() == normalized)
            .ok_or_else(|| RetroError::UnknownWatermark(s.to_string()))
    }
}

/// Stamp `watermark` onto `image`. `scale` multiplies the text size and
/// margin; non-positive or non-finite scales count as 1.0.
pub fn apply_watermark(image: &Image, watermark: WatermarkType, custom_text: &str, scale: f32) -> Image {
    if watermark == WatermarkType::None {
        return image.clone();
    }
    draw_text(image, &watermark.text(custom_text), &watermark.style(), scale)
}

/// Draw `text` onto `image` with the bitmap font.
///
/// Text running past the image edges is clipped.
pub fn draw_text(image: &Image, text: &str, style: &WatermarkStyle, scale: f32) -> Image {
    if image.is_empty() || text.is_empty() || style.color.a <= 0.0 {
        return image.clone();
    }
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let (width, height) = (image.width() as i64, image.height() as i64);

    // Font pixel size; never taller than the image so the arithmetic stays small.
    let dot = (style.size * scale / GLYPH_ROWS as f32)
        .round()
        .clamp(1.0, image.height() as f32) as i64;
    let margin = (WATERMARK_MARGIN * scale).round().clamp(0.0, width.max(height) as f32) as i64;

    let glyphs: Vec<[u8; 7]> = text.chars().map(glyph).collect();
    let text_w = glyphs.len() as i64 * GLYPH_ADVANCE * dot - dot;
    let text_h = GLYPH_ROWS * dot;

    let (x0, y0) = match style.position {
        WatermarkPosition::TopLeft => (margin, margin),
        WatermarkPosition::TopRight => (width - text_w - margin, margin),
        WatermarkPosition::BottomLeft => (margin, height - text_h - margin),
        WatermarkPosition::BottomRight => (width - text_w - margin, height - text_h - margin),
        WatermarkPosition::BottomCenter => ((width - text_w) / 2, height - text_h - margin),
    };
    let ink = style.color.to_pixel();

    log::debug!(
        "watermark '{}' at ({}, {}) on {} image",
        text,
        x0,
        y0,
        image.extent()
    );

    image.map_pixels(|x, y, px| {
        let lx = x as i64 - x0;
        let ly = y as i64 - y0;
        if lx < 0 || ly < 0 || lx >= text_w || ly >= text_h {
            return px;
        }
        let column = lx / dot;
        let cell = column % GLYPH_ADVANCE;
        if cell >= GLYPH_WIDTH {
            return px;
        }
        let bits = glyphs[(column / GLYPH_ADVANCE) as usize][(ly / dot) as usize];
        if (bits >> (GLYPH_WIDTH - 1 - cell)) & 1 == 1 {
            source_over(ink, px)
        } else {
            px
        }
    })
}

/// Rows of a 5×7 glyph, most significant of the low five bits leftmost.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        ' ' => [0x00; 7],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '\'' => [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 23)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    fn gray() -> Image {
        Image::solid(200, 100, [0.2, 0.2, 0.2, 1.0])
    }

    /// Bounding box (min_x, min_y, max_x, max_y) of changed pixels.
    fn ink_bounds(before: &Image, after: &Image) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..before.height() {
            for x in 0..before.width() {
                if before.pixel(x, y) != after.pixel(x, y) {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
                    });
                }
            }
        }
        bounds
    }

    #[test]
    fn test_texts() {
        let t = when();
        assert_eq!(WatermarkType::None.text_at("", t), "");
        assert_eq!(WatermarkType::Timestamp.text_at("", t), "2025.05.23 14:05");
        assert_eq!(WatermarkType::CcdBrand.text_at("", t), "CCD FILM CAMERA");
        assert_eq!(WatermarkType::Vintage.text_at("", t), "'90s 05.23");
        assert_eq!(WatermarkType::FilmDate.text_at("", t), "FILM 2025/05/23");
        assert_eq!(WatermarkType::CustomText.text_at("", t), "Custom Text");
        assert_eq!(WatermarkType::CustomText.text_at("Tokyo", t), "Tokyo");
    }

    #[test]
    fn test_none_is_identity() {
        let img = gray();
        assert_eq!(apply_watermark(&img, WatermarkType::None, "ignored", 1.0), img);
    }

    #[test]
    fn test_brand_in_bottom_left() {
        let img = gray();
        let out = apply_watermark(&img, WatermarkType::CcdBrand, "", 1.0);
        let (min_x, _, _, max_y) = ink_bounds(&img, &out).unwrap();
        // Size 11 gives 2-pixel font dots; 10-pixel margin.
        assert_eq!(min_x, 10);
        assert_eq!(max_y, 100 - 10 - 1);
        // Second row of the leading 'C' starts at the left margin.
        let ink = out.pixel(10, 100 - 10 - 14 + 2);
        assert!(ink[0] > 0.9 && ink[2] < 0.1, "brand text is yellow, got {ink:?}");
    }

    #[test]
    fn test_custom_text_in_bottom_right() {
        let img = gray();
        let out = apply_watermark(&img, WatermarkType::CustomText, "HH", 1.0);
        let (min_x, min_y, max_x, max_y) = ink_bounds(&img, &out).unwrap();
        // "HH" is 11 font pixels wide and 7 tall at 2 pixels each.
        assert_eq!((max_x, max_y), (200 - 10 - 1, 100 - 10 - 1));
        assert_eq!((max_x - min_x + 1, max_y - min_y + 1), (22, 14));
        assert_eq!(out.pixel(max_x, max_y), Color::WHITE.to_pixel());
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        let img = gray();
        let style = WatermarkType::CustomText.style();
        assert_eq!(draw_text(&img, "film", &style, 1.0), draw_text(&img, "FILM", &style, 1.0));
    }

    #[test]
    fn test_oversized_text_is_clipped() {
        let img = Image::solid(8, 4, [0.0, 0.0, 0.0, 1.0]);
        let style = WatermarkType::Vintage.style();
        let out = draw_text(&img, "A VERY LONG WATERMARK", &style, 1.0e9);
        assert_eq!(out.extent(), img.extent());
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!("ccd_brand".parse::<WatermarkType>().unwrap(), WatermarkType::CcdBrand);
        assert_eq!("Film-Date".parse::<WatermarkType>().unwrap(), WatermarkType::FilmDate);
        assert!("signature".parse::<WatermarkType>().is_err());
        assert!(!WatermarkType::Timestamp.is_premium());
        assert!(WatermarkType::Vintage.is_premium());
    }
}
