use crate::percentiles::interpolated_percentile;

/// Count, location and spread of a sample.
///
/// Follows the conventions of a tabular `describe()`: the standard deviation
/// is the sample one (`n - 1` denominator) and the median interpolates
/// between the two middle values.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample variance; `0.0` for a single value.
    pub variance: f64,
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Summarizes the finite values of `values`, `None` when there are none.
    ///
    /// ```
    /// # use oncosurv_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([61.0, 48.0, f64::NAN, 55.0]).unwrap();
    /// assert_eq!(stats.count, 3);
    /// assert_eq!((stats.min, stats.median, stats.max), (48.0, 55.0, 61.0));
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut finite = values.into_iter().filter(|v| v.is_finite()).collect::<Vec<_>>();
        finite.sort_by(f64::total_cmp);
        Self::from_sorted(&finite)
    }

    /// Same as [`DescriptiveStats::new`] for values already in ascending order.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `sorted_values` is out of order.
    ///
    /// ```
    /// # use oncosurv_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[40.0, 50.0, 60.0, 70.0]).unwrap();
    /// assert_eq!(stats.median, 55.0);
    /// assert_eq!(stats.mean, 55.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        debug_assert!(
            sorted_values.windows(2).all(|w| w[0] <= w[1]),
            "input must be in ascending order"
        );
        let (&first, &last) = (sorted_values.first()?, sorted_values.last()?);

        let count = sorted_values.len();
        let mean = sorted_values.iter().sum::<f64>() / count as f64;
        let squares = sorted_values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
        let variance = if count > 1 {
            squares / (count - 1) as f64
        } else {
            0.0
        };

        Some(Self {
            count,
            min: first,
            max: last,
            mean,
            median: interpolated_percentile(sorted_values, 50.0),
            variance,
            std_dev: variance.sqrt(),
        })
    }
}
