//! Kaplan-Meier survival curves by group

use oncosurv_stats::survival::KaplanMeierCurve;
use plotters::{coord::Shift, prelude::*};

use super::style::PlotStyle;

/// One curve of the plot.
#[derive(Debug, Clone, Copy)]
pub struct KmSeries<'a> {
    pub label: &'a str,
    pub curve: &'a KaplanMeierCurve,
    /// Last observed time of the group; the curve is drawn flat up to it.
    pub horizon: f64,
}

/// Step-shaped outline of the confidence band: upper bound forward, lower
/// bound backward.
fn confidence_band(curve: &KaplanMeierCurve, until: f64) -> Vec<(f64, f64)> {
    let mut upper = vec![(0.0, 1.0)];
    let mut lower = vec![(0.0, 1.0)];
    let (mut up, mut lo) = (1.0, 1.0);
    for ((&t, &ub), &lb) in curve
        .times
        .iter()
        .zip(&curve.upper_bound)
        .zip(&curve.lower_bound)
    {
        upper.extend([(t, up), (t, ub)]);
        lower.extend([(t, lo), (t, lb)]);
        up = ub;
        lo = lb;
    }
    upper.push((until, up));
    lower.push((until, lo));
    upper.extend(lower.into_iter().rev());
    upper
}

/// Survival function per group with shaded confidence bands.
pub fn draw_km_plot<DB>(
    root: &DrawingArea<DB, Shift>,
    style: &PlotStyle,
    series: &[KmSeries<'_>],
    total_patients: usize,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE)?;

    let max_time = series
        .iter()
        .map(|s| s.horizon.max(s.curve.times.last().copied().unwrap_or(0.0)))
        .fold(0.0, f64::max);
    let x_max = if max_time > 0.0 { max_time * 1.05 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("Survival Function by Tumor Stage ({total_patients} patients)"),
            style.title_font(),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, 0.0..1.05)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("Time to Death from Diagnosis (days)")
        .y_desc("Survival Probability")
        .label_style(style.label_font())
        .axis_desc_style(style.label_font());
    if !style.grid {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    // legend title
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label("Tumor Stage");

    for (idx, s) in series.iter().enumerate() {
        let color = style.color(idx);
        let until = s.horizon.max(s.curve.times.last().copied().unwrap_or(0.0));

        chart.draw_series(std::iter::once(Polygon::new(
            confidence_band(s.curve, until),
            color.mix(0.2).filled(),
        )))?;
        chart
            .draw_series(LineSeries::new(
                s.curve.step_points(Some(until)),
                color.stroke_width(2),
            ))?
            .label(s.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(style.label_font())
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use oncosurv_stats::survival::Observation;

    use super::*;
    use crate::render::test_util::render_to_string;

    #[test]
    fn test_band_encloses_curve_outline() {
        let curve = KaplanMeierCurve::from_observations(vec![
            Observation::new(5.0, true),
            Observation::new(8.0, false),
            Observation::new(12.0, true),
            Observation::new(20.0, false),
        ]);
        let band = confidence_band(&curve, 20.0);
        // upper: start, 2 per event, end; lower: the same, reversed
        assert_eq!(band.len(), 2 * (1 + 2 * curve.times.len() + 1));
        assert_eq!(band.first(), Some(&(0.0, 1.0)));
        assert_eq!(band.last(), Some(&(0.0, 1.0)));
    }

    #[test]
    fn test_plot_has_title_labels_and_legend() {
        let early = KaplanMeierCurve::from_observations(
            (1..=10).map(|t| Observation::new(f64::from(t) * 30.0, t % 3 != 0)).collect(),
        );
        let late = KaplanMeierCurve::from_observations(
            (1..=10).map(|t| Observation::new(f64::from(t) * 90.0, t % 2 == 0)).collect(),
        );
        let series = [
            KmSeries { label: "stage i", curve: &early, horizon: 300.0 },
            KmSeries { label: "stage iv", curve: &late, horizon: 900.0 },
        ];
        let style = PlotStyle::default();

        let svg = render_to_string(style.size(), |root| {
            draw_km_plot(root, &style, &series, 20).unwrap();
        });

        assert!(svg.contains("Survival Function by Tumor Stage (20 patients)"));
        assert!(svg.contains("Time to Death from Diagnosis (days)"));
        assert!(svg.contains("Survival Probability"));
        assert!(svg.contains("Tumor Stage"));
        assert!(svg.contains("stage iv"));
    }
}
