use std::ops::Range;

/// A histogram of a dataset's distribution with equal-width bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    /// Inclusive start, exclusive end. The last bin also holds values equal
    /// to its end.
    pub range: Range<f64>,
    pub count: u64,
}

impl Histogram {
    /// Creates a histogram with `num_bins` equal-width bins.
    ///
    /// The bins span the data range, or `explicit_range` when given. Non-finite
    /// values and values outside an explicit range are not counted.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oncosurv_stats::histogram::Histogram;
    /// let values = [1.0, 2.0, 2.5, 4.0, 5.0];
    /// let histogram = Histogram::new(values, 4, None);
    /// let counts: Vec<u64> = histogram.bins.iter().map(|b| b.count).collect();
    /// assert_eq!(counts, vec![1, 2, 0, 2]);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize, explicit_range: Option<Range<f64>>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        if values.is_empty() || num_bins == 0 {
            return Self { bins: vec![] };
        }

        let (min, max) = explicit_range.map_or_else(
            || {
                values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
            },
            |range| (range.start, range.end),
        );
        // All values identical: give the single spike a unit width.
        let width = if max - min < f64::EPSILON {
            1.0 / num_bins as f64
        } else {
            (max - min) / num_bins as f64
        };

        let mut bins = (0..num_bins)
            .map(|idx| HistogramBin {
                range: min + width * idx as f64..min + width * (idx + 1) as f64,
                count: 0,
            })
            .collect::<Vec<_>>();

        for val in values {
            if val < min || val > min + width * num_bins as f64 {
                continue;
            }
            let idx = (((val - min) / width).floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }

        Self { bins }
    }

    /// Largest bin count, `0` for an empty histogram.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_value_lands_in_last_bin() {
        let histogram = Histogram::new([0.0, 10.0], 5, None);
        assert_eq!(histogram.bins.len(), 5);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[4].count, 1);
        assert_eq!(histogram.total(), 2);
    }

    #[test]
    fn test_constant_values_form_one_spike() {
        let histogram = Histogram::new([3.0; 7], 20, None);
        assert_eq!(histogram.bins[0].count, 7);
        assert_eq!(histogram.max_count(), 7);
    }

    #[test]
    fn test_explicit_range_excludes_outside_values() {
        let histogram = Histogram::new([-5.0, 1.0, 2.0, 50.0], 2, Some(0.0..4.0));
        assert_eq!(histogram.total(), 2);
        assert_eq!(histogram.bins[0].range, 0.0..2.0);
    }

    #[test]
    fn test_empty_input_yields_no_bins() {
        assert!(Histogram::new([f64::NAN], 10, None).bins.is_empty());
    }
}
