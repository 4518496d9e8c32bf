//! SVG chart rendering
//!
//! Every chart is drawn onto a caller-supplied drawing area from fully
//! computed data, with an explicit [`style::PlotStyle`]. [`save_svg`] wires a
//! chart to an output file.

use std::{io, path::Path};

use anyhow::Context;
use plotters::{
    coord::Shift,
    prelude::{DrawingArea, DrawingAreaErrorKind, IntoDrawingArea as _, SVGBackend},
};

use self::style::PlotStyle;

pub mod demographics;
pub mod heatmap;
pub mod importance;
pub mod km;
pub mod style;

/// Draws a chart into an SVG file sized by `style`.
pub fn save_svg<F>(path: &Path, style: &PlotStyle, draw: F) -> anyhow::Result<()>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<(), DrawingAreaErrorKind<io::Error>>,
{
    let root = SVGBackend::new(path, style.size()).into_drawing_area();
    draw(&root).with_context(|| format!("Failed to draw chart: {}", path.display()))?;
    root.present()
        .with_context(|| format!("Failed to write SVG file: {}", path.display()))?;
    println!("  Chart saved to: {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_util {
    use plotters::{coord::Shift, prelude::*};

    /// Renders into an in-memory SVG document.
    pub(crate) fn render_to_string<F>(size: (u32, u32), draw: F) -> String
    where
        F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>),
    {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            draw(&root);
            root.present().unwrap();
        }
        svg
    }
}
