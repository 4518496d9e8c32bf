//! Gaussian kernel density estimation

use std::ops::Range;

use statrs::distribution::{Continuous, Normal};

use crate::descriptive::DescriptiveStats;

/// Gaussian kernel density estimate with Scott's rule bandwidth.
///
/// The bandwidth is `std_dev * n^(-1/5)`, using the sample standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fits the finite values of `values`.
    ///
    /// Returns `None` for fewer than two finite values or when they are all
    /// equal, since the bandwidth would be zero.
    ///
    /// ```
    /// # use oncosurv_stats::kde::GaussianKde;
    /// let kde = GaussianKde::new([50.0, 55.0, 60.0, 65.0]).unwrap();
    /// assert!(kde.density(57.5) > kde.density(80.0));
    /// assert!(GaussianKde::new([60.0, 60.0]).is_none());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let samples = values.into_iter().filter(|v| v.is_finite()).collect::<Vec<_>>();
        if samples.len() < 2 {
            return None;
        }
        let stats = DescriptiveStats::new(samples.iter().copied())?;
        let bandwidth = stats.std_dev * (samples.len() as f64).powf(-0.2);
        (bandwidth > 0.0).then_some(Self { samples, bandwidth })
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Estimated probability density at `x`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn density(&self, x: f64) -> f64 {
        let kernel = Normal::standard();
        let sum = self
            .samples
            .iter()
            .map(|&xi| kernel.pdf((x - xi) / self.bandwidth))
            .sum::<f64>();
        sum / (self.samples.len() as f64 * self.bandwidth)
    }

    /// Density at `points` evenly spaced positions spanning `range`, ends included.
    ///
    /// ```
    /// # use oncosurv_stats::kde::GaussianKde;
    /// let kde = GaussianKde::new([1.0, 2.0, 3.0]).unwrap();
    /// let curve = kde.evaluate(0.0..4.0, 5);
    /// let xs: Vec<f64> = curve.iter().map(|(x, _)| *x).collect();
    /// assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn evaluate(&self, range: Range<f64>, points: usize) -> Vec<(f64, f64)> {
        match points {
            0 => vec![],
            1 => vec![(range.start, self.density(range.start))],
            _ => {
                let step = (range.end - range.start) / (points - 1) as f64;
                (0..points)
                    .map(|i| {
                        let x = range.start + step * i as f64;
                        (x, self.density(x))
                    })
                    .collect()
            }
        }
    }
}
