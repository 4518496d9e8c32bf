//! Lower-triangle p-value heatmap

use oncosurv_analysis::stage::PairwiseMatrix;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

use super::style::{COOLWARM, PlotStyle, gradient};

/// Annotation colour of p-values below the significance threshold.
const SIGNIFICANT: RGBColor = RGBColor(0, 128, 0);
const NOT_SIGNIFICANT: RGBColor = RGBColor(255, 0, 0);

/// Width reserved for the colour bar, in pixels.
const COLORBAR_WIDTH: i32 = 140;
const COLORBAR_STEPS: u32 = 100;

/// Label of a segment centre, empty for boundaries.
fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(idx) => labels.get(*idx).cloned().unwrap_or_default(),
        SegmentValue::Exact(_) | SegmentValue::Last => String::new(),
    }
}

/// Heatmap of the defined cells of `matrix` on a cool-warm scale over
/// `[0, 1]`, each annotated with its p-value.
pub fn draw_pvalue_heatmap<DB>(
    root: &DrawingArea<DB, Shift>,
    style: &PlotStyle,
    matrix: &PairwiseMatrix,
    significance_threshold: f64,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;
    let n = matrix.size();
    if n == 0 {
        return Ok(());
    }

    let (width, _) = root.dim_in_pixel();
    let split = i32::try_from(width)
        .unwrap_or(i32::MAX)
        .saturating_sub(COLORBAR_WIDTH)
        .max(0);
    let (main, bar_area) = root.split_horizontally(split);

    // Rows run top to bottom, the y axis bottom to top.
    let x_labels = matrix.labels().iter().map(ToString::to_string).collect::<Vec<_>>();
    let y_labels = x_labels.iter().rev().cloned().collect::<Vec<_>>();
    let x_formatter = |value: &SegmentValue<usize>| segment_label(&x_labels, value);
    let y_formatter = |value: &SegmentValue<usize>| segment_label(&y_labels, value);
    let row_y = |row: usize| n - 1 - row;
    // integer ranges are inclusive, so `0..n - 1` holds n segments
    let upper = n.saturating_sub(1).max(1);

    let mut chart = ChartBuilder::on(&main)
        .caption("Pairwise Comparisons Between Tumor Stages", style.title_font())
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(110)
        .build_cartesian_2d((0..upper).into_segmented(), (0..upper).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n + 1)
        .y_labels(n + 1)
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .x_label_style(style.label_font().transform(FontTransform::Rotate90))
        .y_label_style(style.label_font())
        .x_desc("Stage Y")
        .y_desc("Stage X")
        .axis_desc_style(style.label_font())
        .draw()?;

    let cells = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| (i, j, matrix.get(i, j)))
        .filter(|(_, _, p)| !p.is_nan())
        .collect::<Vec<_>>();

    chart.draw_series(cells.iter().map(|&(i, j, p)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(j), SegmentValue::Exact(row_y(i))),
                (SegmentValue::Exact(j + 1), SegmentValue::Exact(row_y(i) + 1)),
            ],
            gradient(&COOLWARM, p).filled(),
        )
    }))?;

    let centered = Pos::new(HPos::Center, VPos::Center);
    chart.draw_series(cells.iter().map(|&(i, j, p)| {
        let color = if p < significance_threshold {
            SIGNIFICANT
        } else {
            NOT_SIGNIFICANT
        };
        Text::new(
            format!("{p:.3}"),
            (SegmentValue::CenterOf(j), SegmentValue::CenterOf(row_y(i))),
            style.annotation_style(color).pos(centered),
        )
    }))?;

    draw_colorbar(&bar_area, style)
}

fn draw_colorbar<DB>(
    area: &DrawingArea<DB, Shift>,
    style: &PlotStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    let mut bar = ChartBuilder::on(area)
        .margin_top(60)
        .margin_bottom(100)
        .margin_left(10)
        .margin_right(20)
        .set_label_area_size(LabelAreaPosition::Right, 70)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_desc("p-value")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font())
        .draw()?;

    let step = 1.0 / f64::from(COLORBAR_STEPS);
    bar.draw_series((0..COLORBAR_STEPS).map(|k| {
        let lo = f64::from(k) * step;
        Rectangle::new([(0.0, lo), (1.0, lo + step)], gradient(&COOLWARM, lo + step / 2.0).filled())
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use oncosurv_analysis::pairwise::{PairResult, PairwiseResults};

    use super::*;
    use crate::render::test_util::render_to_string;

    fn matrix() -> PairwiseMatrix {
        let labels: Vec<Arc<str>> =
            vec![Arc::from("stage i"), Arc::from("stage iia"), Arc::from("stage iv")];
        let mut results = PairwiseResults::default();
        results.insert(
            Arc::from("stage i"),
            Arc::from("stage iia"),
            PairResult { test_statistic: 0.4, p_value: 0.5271 },
        );
        results.insert(
            Arc::from("stage iv"),
            Arc::from("stage i"),
            PairResult { test_statistic: 6.3, p_value: 0.0123 },
        );
        PairwiseMatrix::from_results(labels, &results)
    }

    #[test]
    fn test_heatmap_annotates_defined_cells_only() {
        let style = PlotStyle::default();
        let matrix = matrix();
        let svg = render_to_string(style.size(), |root| {
            draw_pvalue_heatmap(root, &style, &matrix, 0.05).unwrap();
        });

        assert!(svg.contains("Pairwise Comparisons Between Tumor Stages"));
        assert!(svg.contains("p-value"));
        assert!(svg.contains("Stage X"));
        assert!(svg.contains("Stage Y"));
        assert!(svg.contains("0.527"));
        assert!(svg.contains("0.012"));
        // the stage iia / stage iv pair has no result
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_empty_matrix_draws_blank_canvas() {
        let style = PlotStyle::default();
        let matrix = PairwiseMatrix::from_results(vec![], &PairwiseResults::default());
        let svg = render_to_string((200, 200), |root| {
            draw_pvalue_heatmap(root, &style, &matrix, 0.05).unwrap();
        });
        assert!(!svg.contains("Pairwise Comparisons"));
    }
}
