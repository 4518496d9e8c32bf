/// Percentiles of a sample, kept in the order they were requested.
///
/// Percentile points are given on the `0..=100` scale.
///
/// ```
/// use oncosurv_stats::percentiles::Percentiles;
///
/// let ages = [30.0, 40.0, 50.0, 60.0, 70.0];
/// let quartiles = Percentiles::new(&ages, &[25.0, 50.0, 75.0]);
/// assert_eq!(quartiles.get(25.0), Some(40.0));
/// assert_eq!(quartiles.get(75.0), Some(60.0));
/// assert_eq!(quartiles.get(90.0), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Percentiles {
    points: Vec<(f64, f64)>,
}

impl Percentiles {
    /// # Panics
    ///
    /// Panics in debug builds if `sorted_values` is out of order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], percentile_points: &[f64]) -> Self {
        debug_assert!(
            sorted_values.windows(2).all(|w| w[0] <= w[1]),
            "input must be in ascending order"
        );
        Self {
            points: percentile_points
                .iter()
                .map(|&p| (p, interpolated_percentile(sorted_values, p)))
                .collect(),
        }
    }

    #[must_use]
    pub fn new(values: &[f64], percentile_points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, percentile_points)
    }

    /// Value at `percentile`, `None` unless it was requested.
    #[must_use]
    pub fn get(&self, percentile: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|(p, _)| (p - percentile).abs() < f64::EPSILON)
            .map(|&(_, value)| value)
    }

    /// `(percentile, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }
}

/// Percentile of ascending data by linear interpolation between the two
/// closest ranks, `NaN` for empty data.
///
/// The rank of percentile `p` over `n` values is `p / 100 * (n - 1)`.
///
/// ```
/// use oncosurv_stats::percentiles::interpolated_percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(interpolated_percentile(&values, 50.0), 2.5);
/// assert_eq!(interpolated_percentile(&values, 0.0), 1.0);
/// assert_eq!(interpolated_percentile(&values, 100.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn interpolated_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    let Some(last) = sorted_values.len().checked_sub(1) else {
        return f64::NAN;
    };
    let rank = (percentile.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(last);
    let weight = rank - lower as f64;
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartiles_interpolate() {
        let quartiles = Percentiles::new(&[10.0, 20.0, 30.0, 40.0], &[25.0, 50.0, 75.0]);
        let values = quartiles.iter().map(|(_, v)| v).collect::<Vec<_>>();
        assert_eq!(values, vec![17.5, 25.0, 32.5]);
    }

    #[test]
    fn test_empty_and_single_value() {
        assert!(interpolated_percentile(&[], 50.0).is_nan());
        assert_eq!(interpolated_percentile(&[42.0], 75.0), 42.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "ascending order")]
    fn test_from_sorted_rejects_unsorted_input_in_debug_builds() {
        let _ = Percentiles::from_sorted(&[3.0, 1.0, 2.0], &[50.0]);
    }
}
