//! Feature importance bar chart

use plotters::{coord::Shift, prelude::*};

use super::style::{PlotStyle, VIRIDIS, gradient};

/// Horizontal bars in ranked order, top to bottom, with a dashed red line at
/// `threshold`.
#[expect(clippy::cast_precision_loss)]
pub fn draw_feature_importances<DB>(
    root: &DrawingArea<DB, Shift>,
    style: &PlotStyle,
    title: &str,
    ranked: &[(&str, f64)],
    threshold: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;

    let n = ranked.len();
    let row_y = |rank: usize| n.saturating_sub(1) - rank;
    let labels = ranked.iter().rev().map(|(f, _)| (*f).to_owned()).collect::<Vec<_>>();
    let formatter = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(idx) => labels.get(*idx).cloned().unwrap_or_default(),
        SegmentValue::Exact(_) | SegmentValue::Last => String::new(),
    };
    // integer ranges are inclusive, so `0..n - 1` holds n segments
    let upper = n.saturating_sub(1).max(1);

    let (lo, hi) = ranked
        .iter()
        .map(|(_, v)| *v)
        .chain([0.0, threshold])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = (hi - lo).max(f64::EPSILON) * 0.05;

    let mut chart = ChartBuilder::on(root)
        .caption(title, style.title_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(200)
        .build_cartesian_2d(lo - pad..hi + pad, (0..upper).into_segmented())?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_y_mesh()
        .y_labels(n + 1)
        .y_label_formatter(&formatter)
        .x_desc("Importance")
        .y_desc("Feature")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font());
    if !style.grid {
        mesh.disable_x_mesh();
    }
    mesh.draw()?;

    let last = n.saturating_sub(1).max(1) as f64;
    chart.draw_series(ranked.iter().enumerate().map(|(rank, (_, value))| {
        let y = row_y(rank);
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(y)),
                (*value, SegmentValue::Exact(y + 1)),
            ],
            gradient(&VIRIDIS, rank as f64 / last).filled(),
        )
    }))?;

    chart.draw_series(DashedLineSeries::new(
        [
            (threshold, SegmentValue::Exact(0)),
            (threshold, SegmentValue::Last),
        ],
        8,
        4,
        RED.stroke_width(2),
    ))?;

    Ok(())
}
