//! Chart styling resolved from the `charts` configuration section

use plotters::style::RGBColor;
use survey_config::ChartsConfig;

const WHITE: RGBColor = RGBColor(255, 255, 255);

/// Parses a `#RRGGBB` color; anything else yields black.
pub fn parse_color(color_str: &str) -> RGBColor {
    if let Some(hex) = color_str.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return RGBColor(r, g, b);
            }
        }
    }
    RGBColor(0, 0, 0)
}

/// Canvas size, fonts and slice colors
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub font_family: String,
    pub title_font_size: u32,
    pub legend_font_size: u32,
    pub palette: Vec<RGBColor>,
}

impl ChartStyle {
    /// Color of the `index`-th slice, cycling through the palette.
    pub fn slice_color(&self, index: usize) -> RGBColor {
        if self.palette.is_empty() {
            return WHITE;
        }
        self.palette[index % self.palette.len()]
    }
}

impl From<&ChartsConfig> for ChartStyle {
    fn from(config: &ChartsConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            background: parse_color(&config.background_color),
            font_family: config.font_family.clone(),
            title_font_size: config.title_font_size,
            legend_font_size: config.legend_font_size,
            palette: config.palette.iter().map(|c| parse_color(c)).collect(),
        }
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self::from(&ChartsConfig::default())
    }
}
