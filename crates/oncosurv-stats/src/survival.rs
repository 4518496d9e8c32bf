use statrs::distribution::{ContinuousCDF, Normal};

/// A single time-to-event observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Time to the event, or to the last observation when censored.
    pub duration: f64,
    /// `true` if the event occurred, `false` if the observation is right-censored.
    pub observed: bool,
}

impl Observation {
    #[must_use]
    pub fn new(duration: f64, observed: bool) -> Self {
        Self { duration, observed }
    }
}

/// Kaplan-Meier survival curve for survival analysis.
///
/// The Kaplan-Meier estimator is a non-parametric statistic used to estimate the survival
/// function from lifetime data. It accounts for censored data (observations where the event
/// of interest has not occurred by the end of the study period).
///
/// # Fields
///
/// The curve stores parallel vectors, one entry per distinct event time:
/// - Time points where events occurred
/// - Survival probability at each time point, with its 95% confidence bounds
/// - Number of subjects at risk at each time point
/// - Number of events (non-censored observations) at each time point
#[derive(Debug, Clone, PartialEq)]
pub struct KaplanMeierCurve {
    /// Time points where events (non-censored observations) occurred.
    pub times: Vec<f64>,
    /// Survival probability at each corresponding time point.
    pub survival_prob: Vec<f64>,
    /// Lower 95% confidence bound of the survival probability.
    pub lower_bound: Vec<f64>,
    /// Upper 95% confidence bound of the survival probability.
    pub upper_bound: Vec<f64>,
    /// Number of subjects at risk (not yet experienced the event or censored) at each time point.
    pub at_risk: Vec<usize>,
    /// Number of events that occurred at each time point.
    pub events: Vec<usize>,
}

impl KaplanMeierCurve {
    /// Two-sided confidence level of [`Self::lower_bound`] and [`Self::upper_bound`].
    pub const CONFIDENCE: f64 = 0.95;

    /// Computes the Kaplan-Meier survival curve from survival data.
    ///
    /// Observations with a non-finite duration are ignored.
    ///
    /// Confidence bounds use Greenwood's variance on the log(-log) scale, so
    /// they always stay within `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oncosurv_stats::survival::{KaplanMeierCurve, Observation};
    /// let data = vec![
    ///     Observation::new(10.0, true),  // death at day 10
    ///     Observation::new(20.0, false), // alive at last follow-up, day 20
    ///     Observation::new(30.0, true),  // death at day 30
    /// ];
    /// let curve = KaplanMeierCurve::from_observations(data);
    /// assert_eq!(curve.times, vec![10.0, 30.0]);
    /// assert!((curve.survival_prob[0] - 2.0 / 3.0).abs() < 1e-12);
    /// assert_eq!(curve.survival_prob[1], 0.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_observations(mut data: Vec<Observation>) -> Self {
        data.retain(|obs| obs.duration.is_finite());
        data.sort_by(|a, b| a.duration.total_cmp(&b.duration));

        let z = Normal::standard().inverse_cdf(0.5 + Self::CONFIDENCE / 2.0);

        let mut curve = Self {
            times: vec![],
            survival_prob: vec![],
            lower_bound: vec![],
            upper_bound: vec![],
            at_risk: vec![],
            events: vec![],
        };

        let mut current_survival = 1.0;
        let mut greenwood_sum = 0.0;
        let total = data.len();

        let mut i = 0;
        while i < data.len() {
            let current_time = data[i].duration;
            let at_risk = total - i;

            let mut event_count = 0;
            let mut j = i;
            while j < data.len() && data[j].duration.total_cmp(&current_time).is_eq() {
                if data[j].observed {
                    event_count += 1;
                }
                j += 1;
            }

            if event_count > 0 {
                let n = at_risk as f64;
                let d = event_count as f64;
                current_survival *= 1.0 - d / n;
                if at_risk > event_count {
                    greenwood_sum += d / (n * (n - d));
                }
                let (lower, upper) = log_log_bounds(current_survival, greenwood_sum, z);

                curve.times.push(current_time);
                curve.survival_prob.push(current_survival);
                curve.lower_bound.push(lower);
                curve.upper_bound.push(upper);
                curve.at_risk.push(at_risk);
                curve.events.push(event_count);
            }

            i = j;
        }

        curve
    }

    /// Returns the median survival time.
    ///
    /// The first event time at which the survival probability drops to or
    /// below 50%, `None` if it never does.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oncosurv_stats::survival::{KaplanMeierCurve, Observation};
    /// let data = vec![
    ///     Observation::new(100.0, true),
    ///     Observation::new(100.0, true),
    ///     Observation::new(300.0, true),
    ///     Observation::new(400.0, false),
    /// ];
    /// let curve = KaplanMeierCurve::from_observations(data);
    /// assert_eq!(curve.median_survival(), Some(100.0));
    /// ```
    #[must_use]
    pub fn median_survival(&self) -> Option<f64> {
        self.times
            .iter()
            .zip(&self.survival_prob)
            .find(|(_, s)| **s <= 0.5)
            .map(|(t, _)| *t)
    }

    /// Returns the survival probability at a specific time.
    ///
    /// Step function: `1.0` before the first event, constant between events.
    ///
    /// # Examples
    ///
    /// ```
    /// # use oncosurv_stats::survival::{KaplanMeierCurve, Observation};
    /// let data = vec![Observation::new(10.0, true), Observation::new(20.0, true)];
    /// let curve = KaplanMeierCurve::from_observations(data);
    ///
    /// assert_eq!(curve.survival_at(5.0), 1.0);
    /// assert_eq!(curve.survival_at(15.0), 0.5);
    /// ```
    #[must_use]
    pub fn survival_at(&self, time: f64) -> f64 {
        match self.times.partition_point(|t| *t <= time) {
            0 => 1.0,
            idx => self.survival_prob[idx - 1],
        }
    }

    /// Step-function vertices suitable for plotting, starting at `(0, 1)`.
    ///
    /// Each event time contributes two points: the level before the drop and
    /// the level after it. The curve is extended flat to `until` when given.
    #[must_use]
    pub fn step_points(&self, until: Option<f64>) -> Vec<(f64, f64)> {
        let mut points = vec![(0.0, 1.0)];
        let mut level = 1.0;
        for (&t, &s) in self.times.iter().zip(&self.survival_prob) {
            points.push((t, level));
            points.push((t, s));
            level = s;
        }
        if let Some(until) = until {
            if points.last().is_some_and(|(t, _)| *t < until) {
                points.push((until, level));
            }
        }
        points
    }
}

/// Exponential Greenwood bounds: the interval is built for log(-log S) and
/// mapped back, which keeps it inside `[0, 1]`.
fn log_log_bounds(survival: f64, greenwood_sum: f64, z: f64) -> (f64, f64) {
    if survival <= 0.0 || survival >= 1.0 {
        return (survival, survival);
    }
    let log_s = survival.ln();
    let theta = (-log_s).ln();
    let half_width = z * greenwood_sum.sqrt() / log_s.abs();
    let lower = (-(theta + half_width).exp()).exp();
    let upper = (-(theta - half_width).exp()).exp();
    (lower, upper)
}
