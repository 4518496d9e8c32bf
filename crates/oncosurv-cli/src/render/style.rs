use plotters::style::{FontDesc, IntoFont as _, RGBColor, TextStyle};
use serde::{Deserialize, Serialize};

/// Chart appearance, passed to every rendering call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub font_family: String,
    pub title_font_size: u32,
    pub label_font_size: u32,
    /// Series colours as `[r, g, b]`, cycled when there are more series
    pub palette: Vec<[u8; 3]>,
    /// Draw mesh grid lines
    pub grid: bool,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            font_family: "sans-serif".to_owned(),
            title_font_size: 24,
            label_font_size: 14,
            // matplotlib "tab10"
            palette: vec![
                [31, 119, 180],
                [255, 127, 14],
                [44, 160, 44],
                [214, 39, 40],
                [148, 103, 189],
                [140, 86, 75],
                [227, 119, 194],
                [127, 127, 127],
                [188, 189, 34],
                [23, 190, 207],
            ],
            grid: true,
        }
    }
}

impl PlotStyle {
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Colour of the `idx`-th series.
    #[must_use]
    pub fn color(&self, idx: usize) -> RGBColor {
        if self.palette.is_empty() {
            return RGBColor(0, 0, 0);
        }
        let [r, g, b] = self.palette[idx % self.palette.len()];
        RGBColor(r, g, b)
    }

    #[must_use]
    pub fn title_font(&self) -> FontDesc<'_> {
        (self.font_family.as_str(), self.title_font_size).into_font()
    }

    #[must_use]
    pub fn label_font(&self) -> FontDesc<'_> {
        (self.font_family.as_str(), self.label_font_size).into_font()
    }

    #[must_use]
    pub fn annotation_style(&self, color: RGBColor) -> TextStyle<'_> {
        self.label_font().color(&color)
    }
}

/// Linear interpolation between colour stops spread evenly over `[0, 1]`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn gradient(stops: &[[u8; 3]], t: f64) -> RGBColor {
    let Some(last) = stops.len().checked_sub(1) else {
        return RGBColor(0, 0, 0);
    };
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * last as f64;
    let idx = (pos.floor() as usize).min(last.saturating_sub(1));
    let frac = pos - idx as f64;
    let from = stops[idx];
    let to = stops[(idx + 1).min(last)];
    let channel =
        |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;
    RGBColor(
        channel(from[0], to[0]),
        channel(from[1], to[1]),
        channel(from[2], to[2]),
    )
}

/// Diverging blue-to-red scale.
pub const COOLWARM: [[u8; 3]; 5] = [
    [59, 76, 192],
    [141, 176, 254],
    [221, 221, 221],
    [244, 154, 123],
    [180, 4, 38],
];

/// Perceptually uniform dark-purple-to-yellow scale.
pub const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints_and_midpoint() {
        assert_eq!(gradient(&COOLWARM, 0.0), RGBColor(59, 76, 192));
        assert_eq!(gradient(&COOLWARM, 1.0), RGBColor(180, 4, 38));
        assert_eq!(gradient(&COOLWARM, 0.5), RGBColor(221, 221, 221));
        assert_eq!(gradient(&COOLWARM, 7.0), RGBColor(180, 4, 38));
        assert_eq!(gradient(&[], 0.3), RGBColor(0, 0, 0));
    }

    #[test]
    fn test_palette_cycles() {
        let style = PlotStyle {
            palette: vec![[1, 2, 3], [4, 5, 6]],
            ..PlotStyle::default()
        };
        assert_eq!(style.color(2), RGBColor(1, 2, 3));
    }
}
