// src/config.rs

use crate::error::ConfigError;
use palette::{FromColor, Lab, Srgb};
use serde::Deserialize;
use std::str::FromStr;

/// Row spacing is always the circle diameter times this factor.
pub const ROW_SPACING_FACTOR: f32 = 1.25;

/// Horizontal advance of one monospace glyph, in ems.
pub const MONOSPACE_ADVANCE: f32 = 0.6;

/// ColorBrewer "Pastel1", darkened before use.
pub const PASTEL1: [&str; 9] = [
    "#fbb4ae", "#b3cde3", "#ccebc5", "#decbe4", "#fed9a6", "#ffffcc", "#e5d8bd", "#fddaec",
    "#f2f2f2",
];

/// Lab lightness removed from each palette entry.
const DARKEN_AMOUNT: f32 = 18.0;

pub type Color = Srgb<u8>;

/// Geometry, font and colors used by the layout renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub circle_diameter: f32,
    /// Horizontal distance between two lanes
    pub lane_width: f32,
    /// Label font size in pixels
    pub font_size: f32,
    pub margin: f32,
    pub palette: Vec<Color>,
    pub node_fill: Color,
    /// Color of the thin pass drawn over every edge
    pub edge_core: Color,
    pub text_outline: Color,
    pub text_outline_width: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            circle_diameter: 20.0,
            lane_width: 20.0,
            font_size: 14.0,
            margin: 20.0,
            palette: PASTEL1
                .iter()
                .filter_map(|hex| parse_color(hex).ok())
                .map(darken)
                .collect(),
            node_fill: Srgb::new(0xfe, 0xfd, 0xe7),
            edge_core: Srgb::new(0x33, 0x33, 0x33),
            text_outline: Srgb::new(0, 0, 0),
            text_outline_width: 2.0,
        }
    }
}

impl RenderConfig {
    pub fn row_spacing(&self) -> f32 {
        self.circle_diameter * ROW_SPACING_FACTOR
    }

    /// Width of one glyph cell of the label font.
    pub fn char_width(&self) -> f32 {
        self.font_size * MONOSPACE_ADVANCE
    }

    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width()
    }

    /// Loads a TOML settings table on top of the defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings: RenderSettings = toml::from_str(text)?;
        settings.apply(Self::default())
    }
}

/// Optional overrides as they appear in a settings file or a book's `[render]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderSettings {
    pub circle_diameter: Option<f32>,
    pub lane_width: Option<f32>,
    pub font_size: Option<f32>,
    pub margin: Option<f32>,
    /// Hex colors, used as given (not darkened)
    pub palette: Option<Vec<String>>,
    pub node_fill: Option<String>,
    pub edge_core: Option<String>,
}

impl RenderSettings {
    pub fn apply(&self, mut config: RenderConfig) -> Result<RenderConfig, ConfigError> {
        if let Some(v) = self.circle_diameter {
            config.circle_diameter = v;
        }
        if let Some(v) = self.lane_width {
            config.lane_width = v;
        }
        if let Some(v) = self.font_size {
            config.font_size = v;
        }
        if let Some(v) = self.margin {
            config.margin = v;
        }
        if let Some(palette) = &self.palette {
            if palette.is_empty() {
                return Err(ConfigError::EmptyPalette);
            }
            config.palette = palette
                .iter()
                .map(|hex| parse_color(hex))
                .collect::<Result<_, _>>()?;
        }
        if let Some(hex) = &self.node_fill {
            config.node_fill = parse_color(hex)?;
        }
        if let Some(hex) = &self.edge_core {
            config.edge_core = parse_color(hex)?;
        }
        Ok(config)
    }
}

pub fn parse_color(hex: &str) -> Result<Color, ConfigError> {
    Srgb::from_str(hex).map_err(|_| ConfigError::InvalidColor(hex.to_string()))
}

/// Lowers the Lab lightness of a color, like chroma's `darken()`.
pub fn darken(color: Color) -> Color {
    let lab: Lab = Lab::from_color(color.into_format::<f32>());
    let darker: Lab = Lab::new((lab.l - DARKEN_AMOUNT).max(0.0), lab.a, lab.b);
    let srgb: Srgb<f32> = Srgb::from_color(darker);
    let (r, g, b) = srgb.into_components();
    let r_u8 = (r.clamp(0.0, 1.0) * 255.0).round() as u8;
    let g_u8 = (g.clamp(0.0, 1.0) * 255.0).round() as u8;
    let b_u8 = (b.clamp(0.0, 1.0) * 255.0).round() as u8;
    Srgb::new(r_u8, g_u8, b_u8)
}

pub fn to_hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}
