//! Statistical utilities for clinical survival analysis.
//!
//! This crate provides the numeric building blocks used by the cohort
//! analysis:
//!
//! - **Descriptive statistics**: count, mean, median, sample standard deviation
//! - **Percentiles**: linearly interpolated percentiles
//! - **Histograms**: equal-width frequency distributions
//! - **Kernel density**: Gaussian density estimate for smoothing a histogram
//! - **Survival analysis**: Kaplan-Meier estimator with confidence bounds
//! - **Log-rank test**: two-group comparison of survival distributions
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and storage
//! - [`histogram`]: Histogram construction for visualizing data distributions
//! - [`kde`]: Gaussian kernel density estimation
//! - [`survival`]: Kaplan-Meier survival curves for time-to-event data
//! - [`logrank`]: Log-rank test between two groups of observations
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use oncosurv_stats::descriptive::DescriptiveStats;
//!
//! let ages = [54.0, 61.0, 47.0, 70.0, 66.0];
//! let stats = DescriptiveStats::new(ages).unwrap();
//! assert_eq!(stats.median, 61.0);
//! ```
//!
//! ## Creating a histogram
//!
//! ```
//! use oncosurv_stats::histogram::Histogram;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
//! let histogram = Histogram::new(values, 5, None);
//! assert_eq!(histogram.total(), 10);
//! ```
//!
//! ## Analyzing survival data
//!
//! ```
//! use oncosurv_stats::survival::{KaplanMeierCurve, Observation};
//!
//! let data = vec![
//!     Observation::new(10.0, true),  // Event occurred at day 10
//!     Observation::new(20.0, false), // Censored at day 20
//!     Observation::new(30.0, true),  // Event occurred at day 30
//! ];
//! let curve = KaplanMeierCurve::from_observations(data);
//! assert_eq!(curve.times, vec![10.0, 30.0]);
//! ```

pub mod descriptive;
pub mod histogram;
pub mod kde;
pub mod logrank;
pub mod percentiles;
pub mod survival;
