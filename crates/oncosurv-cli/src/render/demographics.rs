//! Age histogram and category count plots

use oncosurv_analysis::demographics::CategoryCounts;
use oncosurv_stats::histogram::Histogram;
use plotters::{coord::Shift, prelude::*};

use super::style::PlotStyle;

fn y_limit(max_count: f64) -> f64 {
    max_count.max(1.0) * 1.1
}

/// Bars of a precomputed age histogram, with the density curve on top.
///
/// `density` is in count units; an empty curve draws bars only.
#[expect(clippy::cast_precision_loss)]
pub fn draw_age_histogram<DB>(
    root: &DrawingArea<DB, Shift>,
    style: &PlotStyle,
    histogram: &Histogram,
    density: &[(f64, f64)],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;

    let (x_min, x_max) = match (histogram.bins.first(), histogram.bins.last()) {
        (Some(first), Some(last)) => (first.range.start, last.range.end),
        _ => (0.0, 1.0),
    };
    let y_max = density
        .iter()
        .map(|(_, d)| *d)
        .fold(histogram.max_count() as f64, f64::max);

    let mut chart = ChartBuilder::on(root)
        .caption("Distribution of Age at Index", style.title_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0.0..y_limit(y_max))?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("Age at Index")
        .y_desc("Frequency")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font());
    if !style.grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    let color = style.color(0);
    chart.draw_series(histogram.bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.range.start, 0.0), (bin.range.end, bin.count as f64)],
            color.mix(0.7).filled(),
        )
    }))?;
    chart.draw_series(histogram.bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.range.start, 0.0), (bin.range.end, bin.count as f64)],
            BLACK.stroke_width(1),
        )
    }))?;
    if !density.is_empty() {
        chart.draw_series(LineSeries::new(density.iter().copied(), color.stroke_width(2)))?;
    }

    Ok(())
}

/// Vertical bar per category, most frequent first.
///
/// `rotate_labels` turns the category names vertical for long labels.
#[expect(clippy::cast_precision_loss)]
pub fn draw_category_counts<DB>(
    root: &DrawingArea<DB, Shift>,
    style: &PlotStyle,
    title: &str,
    counts: &CategoryCounts,
    rotate_labels: bool,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;

    let bars = counts.by_count();
    let max_count = bars.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let labels = bars.iter().map(|(label, _)| (*label).to_owned()).collect::<Vec<_>>();
    let formatter = |value: &SegmentValue<usize>| match value {
        SegmentValue::CenterOf(idx) => labels.get(*idx).cloned().unwrap_or_default(),
        SegmentValue::Exact(_) | SegmentValue::Last => String::new(),
    };
    // integer ranges are inclusive, so `0..n - 1` holds n segments
    let upper = bars.len().saturating_sub(1).max(1);

    let mut chart = ChartBuilder::on(root)
        .caption(title, style.title_font())
        .margin(20)
        .x_label_area_size(if rotate_labels { 180 } else { 50 })
        .y_label_area_size(60)
        .build_cartesian_2d((0..upper).into_segmented(), 0.0..y_limit(max_count as f64))?;

    let mut label_style = TextStyle::from(style.label_font());
    if rotate_labels {
        label_style = label_style.transform(FontTransform::Rotate90);
    }

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .x_labels(bars.len() + 1)
        .x_label_formatter(&formatter)
        .x_label_style(label_style)
        .y_desc("Count")
        .y_label_style(style.label_font())
        .axis_desc_style(style.label_font());
    if !style.grid {
        mesh.disable_y_mesh();
    }
    mesh.draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(idx, (_, count))| {
        Rectangle::new(
            [
                (SegmentValue::Exact(idx), 0.0),
                (SegmentValue::Exact(idx + 1), *count as f64),
            ],
            style.color(idx).filled(),
        )
    }))?;

    Ok(())
}
