//! The built-in filter styles and their operator recipes.
//!
//! Each style is a fixed, ordered list of [`StageSpec`] values. The order is
//! part of the look: swapping two stages changes the result.

use crate::core::error::RetroError;
use crate::execution::chain::StageSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Style category, used to group styles for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StyleCategory {
    /// The unfiltered style
    Original,
    /// Early digital compact cameras
    Ccd,
    /// Film stocks
    Film,
    /// Vintage and stylized looks
    Vintage,
    /// Styles declared in configuration
    #[default]
    Custom,
}

impl StyleCategory {
    /// Human-readable category name.
    pub fn display_name(&self) -> &'static str {
        match self {
            StyleCategory::Original => "Original",
            StyleCategory::Ccd => "CCD",
            StyleCategory::Film => "Film",
            StyleCategory::Vintage => "Vintage",
            StyleCategory::Custom => "Custom",
        }
    }
}

/// Built-in filter styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FilterStyle {
    /// Identity
    #[default]
    None,
    /// `ccd-classic`
    CcdClassic,
    /// `ccd-warm`
    CcdWarm,
    /// `ccd-cool`
    CcdCool,
    /// `ccd-night`
    CcdNight,
    /// `fuji-400h`
    #[serde(rename = "fuji-400h")]
    Fuji400h,
    /// `kodak-gold-200`
    #[serde(rename = "kodak-gold-200")]
    KodakGold200,
    /// `agfa-vista`
    AgfaVista,
    /// `ilford-hp5`
    #[serde(rename = "ilford-hp5")]
    IlfordHp5,
    /// `leica`
    Leica,
    /// `vintage-90s`
    #[serde(rename = "vintage-90s")]
    Vintage90s,
    /// `retrowave`
    Retrowave,
    /// `lofi`
    Lofi,
}

impl FilterStyle {
    /// All styles in display order.
    pub const ALL: [FilterStyle; 13] = [
        FilterStyle::None,
        FilterStyle::CcdClassic,
        FilterStyle::CcdWarm,
        FilterStyle::CcdCool,
        FilterStyle::CcdNight,
        FilterStyle::Fuji400h,
        FilterStyle::KodakGold200,
        FilterStyle::AgfaVista,
        FilterStyle::IlfordHp5,
        FilterStyle::Leica,
        FilterStyle::Vintage90s,
        FilterStyle::Retrowave,
        FilterStyle::Lofi,
    ];

    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        match self {
            FilterStyle::None => "none",
            FilterStyle::CcdClassic => "ccd-classic",
            FilterStyle::CcdWarm => "ccd-warm",
            FilterStyle::CcdCool => "ccd-cool",
            FilterStyle::CcdNight => "ccd-night",
            FilterStyle::Fuji400h => "fuji-400h",
            FilterStyle::KodakGold200 => "kodak-gold-200",
            FilterStyle::AgfaVista => "agfa-vista",
            FilterStyle::IlfordHp5 => "ilford-hp5",
            FilterStyle::Leica => "leica",
            FilterStyle::Vintage90s => "vintage-90s",
            FilterStyle::Retrowave => "retrowave",
            FilterStyle::Lofi => "lofi",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterStyle::None => "Original",
            FilterStyle::CcdClassic => "CCD Classic",
            FilterStyle::CcdWarm => "CCD Warm",
            FilterStyle::CcdCool => "CCD Cool",
            FilterStyle::CcdNight => "CCD Night",
            FilterStyle::Fuji400h => "Fuji 400H",
            FilterStyle::KodakGold200 => "Kodak Gold 200",
            FilterStyle::AgfaVista => "Agfa Vista",
            FilterStyle::IlfordHp5 => "Ilford HP5",
            FilterStyle::Leica => "Leica",
            FilterStyle::Vintage90s => "90s",
            FilterStyle::Retrowave => "Retrowave",
            FilterStyle::Lofi => "Lo-Fi",
        }
    }

    /// Short description for listings.
    pub fn description(&self) -> &'static str {
        match self {
            FilterStyle::None => "Unfiltered image",
            FilterStyle::CcdClassic => "Early digital compact: muted, green-leaning, noisy",
            FilterStyle::CcdWarm => "Warm white balance with light grain",
            FilterStyle::CcdCool => "Cool white balance with blue-cyan gains",
            FilterStyle::CcdNight => "Dark, contrasty, heavy sensor noise",
            FilterStyle::Fuji400h => "Soft green pastel film",
            FilterStyle::KodakGold200 => "Warm saturated consumer film",
            FilterStyle::AgfaVista => "Punchy saturated film",
            FilterStyle::IlfordHp5 => "Black and white film with grain",
            FilterStyle::Leica => "Contrasty rangefinder rendering with lifted blacks",
            FilterStyle::Vintage90s => "Faded colors with a warm light leak",
            FilterStyle::Retrowave => "Purple and cyan channel mix",
            FilterStyle::Lofi => "Hard contrast, dark corners, coarse grain",
        }
    }

    /// Category for grouping.
    pub fn category(&self) -> StyleCategory {
        match self {
            FilterStyle::None => StyleCategory::Original,
            FilterStyle::CcdClassic | FilterStyle::CcdWarm | FilterStyle::CcdCool | FilterStyle::CcdNight => {
                StyleCategory::Ccd
            }
            FilterStyle::Fuji400h
            | FilterStyle::KodakGold200
            | FilterStyle::AgfaVista
            | FilterStyle::IlfordHp5
            | FilterStyle::Leica => StyleCategory::Film,
            FilterStyle::Vintage90s | FilterStyle::Retrowave | FilterStyle::Lofi => StyleCategory::Vintage,
        }
    }

    /// Whether the style is part of the paid set.
    pub fn is_premium(&self) -> bool {
        !matches!(
            self,
            FilterStyle::None | FilterStyle::CcdClassic | FilterStyle::CcdWarm | FilterStyle::Vintage90s | FilterStyle::Leica
        )
    }

    /// Whether the style leaves images untouched.
    pub fn is_identity(&self) -> bool {
        *self == FilterStyle::None
    }

    /// The ordered stages of this style.
    pub fn stages(&self) -> Vec<StageSpec> {
        builtin_stages(*self)
    }
}

impl fmt::Display for FilterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FilterStyle {
    type Err = RetroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_id(s);
        FilterStyle::ALL
            .into_iter()
            .find(|style| style.id() == normalized)
            .ok_or_else(|| RetroError::UnknownStyle(s.to_string()))
    }
}

/// Lowercase, trimmed, `_` replaced by `-`.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_lowercase().replace('_', "-")
}

// ============================================================================
// Recipes
// ============================================================================

fn controls(saturation: f32, brightness: f32, contrast: f32) -> StageSpec {
    StageSpec::ColorControls {
        saturation,
        brightness,
        contrast,
    }
}

fn gains(r: f32, g: f32, b: f32) -> StageSpec {
    StageSpec::Gains { r, g, b }
}

fn white_balance(neutral: (f32, f32), target: (f32, f32)) -> StageSpec {
    StageSpec::WhiteBalance { neutral, target }
}

fn vignette(intensity: f32, radius: f32) -> StageSpec {
    StageSpec::Vignette { intensity, radius }
}

/// Lifted blacks, slightly compressed highlights.
const LEICA_CURVE: [(f32, f32); 5] = [(0.0, 0.22), (0.25, 0.3), (0.5, 0.5), (0.75, 0.7), (1.0, 1.0)];

/// The stage list of a built-in style.
pub fn builtin_stages(style: FilterStyle) -> Vec<StageSpec> {
    match style {
        FilterStyle::None => Vec::new(),
        FilterStyle::CcdClassic => vec![
            controls(0.9, 0.02, 1.05),
            gains(1.05, 1.08, 0.95),
            StageSpec::Noise { intensity: 0.015 },
            vignette(0.3, 1.5),
        ],
        FilterStyle::CcdWarm => vec![
            white_balance((6800.0, 0.0), (5500.0, 10.0)),
            controls(0.95, 0.05, 1.0),
            StageSpec::Grain { intensity: 0.02 },
        ],
        FilterStyle::CcdCool => vec![
            white_balance((6500.0, 0.0), (7500.0, -10.0)),
            gains(0.9, 1.05, 1.1),
        ],
        FilterStyle::CcdNight => vec![
            controls(0.8, -0.1, 1.2),
            StageSpec::Noise { intensity: 0.04 },
            vignette(0.6, 1.2),
        ],
        FilterStyle::Fuji400h => vec![gains(1.0, 1.15, 0.95)],
        FilterStyle::KodakGold200 => vec![controls(1.1, 0.05, 1.0), gains(1.15, 1.05, 0.9)],
        FilterStyle::AgfaVista => vec![controls(1.3, 0.03, 1.1)],
        FilterStyle::IlfordHp5 => vec![
            StageSpec::Monochrome,
            controls(1.0, 0.0, 1.3),
            StageSpec::Grain { intensity: 0.03 },
        ],
        FilterStyle::Leica => vec![
            StageSpec::Exposure { ev: -0.4 },
            controls(0.9, 0.08, 1.3),
            white_balance((6500.0, 0.0), (7300.0, 10.0)),
            StageSpec::ToneCurve { points: LEICA_CURVE },
            StageSpec::SharpenLuminance { sharpness: 0.4 },
            gains(1.1, 1.05, 1.15),
            vignette(0.12, 1.2),
        ],
        FilterStyle::Vintage90s => vec![controls(0.85, 0.1, 1.0), StageSpec::light_leak()],
        FilterStyle::Retrowave => vec![StageSpec::ColorMatrix {
            red: [1.2, 0.0, 0.3],
            green: [0.0, 0.8, 0.2],
            blue: [0.2, 0.0, 1.5],
        }],
        FilterStyle::Lofi => vec![
            controls(1.2, 0.05, 1.4),
            vignette(0.8, 1.0),
            StageSpec::Grain { intensity: 0.04 },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_parse() {
        for style in FilterStyle::ALL {
            assert_eq!(style.id().parse::<FilterStyle>().unwrap(), style);
        }
    }

    #[test]
    fn test_parse_legacy_ids() {
        assert_eq!("ccd_classic".parse::<FilterStyle>().unwrap(), FilterStyle::CcdClassic);
        assert_eq!("Kodak_Gold_200".parse::<FilterStyle>().unwrap(), FilterStyle::KodakGold200);
        assert!(matches!(
            "velvia".parse::<FilterStyle>(),
            Err(RetroError::UnknownStyle(id)) if id == "velvia"
        ));
    }

    #[test]
    fn test_serde_ids_match() {
        for style in FilterStyle::ALL {
            let json = serde_json::to_string(&style).unwrap();
            assert_eq!(json, format!("\"{}\"", style.id()));
        }
    }

    #[test]
    fn test_premium_set() {
        let free: Vec<_> = FilterStyle::ALL.iter().filter(|s| !s.is_premium()).map(|s| s.id()).collect();
        assert_eq!(free, vec!["none", "ccd-classic", "ccd-warm", "leica", "vintage-90s"]);
    }

    #[test]
    fn test_categories() {
        assert_eq!(FilterStyle::None.category(), StyleCategory::Original);
        assert_eq!(FilterStyle::CcdNight.category(), StyleCategory::Ccd);
        assert_eq!(FilterStyle::Leica.category(), StyleCategory::Film);
        assert_eq!(FilterStyle::Lofi.category(), StyleCategory::Vintage);
    }

    #[test]
    fn test_recipe_shapes() {
        assert!(FilterStyle::None.stages().is_empty());
        assert_eq!(FilterStyle::CcdClassic.stages()[1], gains(1.05, 1.08, 0.95));
        assert_eq!(FilterStyle::Leica.stages().len(), 7);
        assert_eq!(FilterStyle::IlfordHp5.stages()[0], StageSpec::Monochrome);
        assert_eq!(FilterStyle::Vintage90s.stages()[1], StageSpec::light_leak());
        for style in FilterStyle::ALL.iter().filter(|s| !s.is_identity()) {
            assert!(!style.stages().is_empty(), "{} has no stages", style);
        }
    }
}
