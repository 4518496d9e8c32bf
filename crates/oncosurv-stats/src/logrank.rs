//! Log-rank test for comparing two survival distributions.
//!
//! The statistic compares, at every distinct event time, the number of
//! events observed in the first group with the number expected if both groups
//! shared one hazard. Summed over all event times and squared against its
//! variance it is chi-square distributed with one degree of freedom under the
//! null hypothesis.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::survival::Observation;

/// Result of a two-group log-rank test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRankTest {
    /// Chi-square test statistic.
    pub test_statistic: f64,
    /// Probability of a statistic at least this extreme under the null hypothesis.
    pub p_value: f64,
    /// Observed events per group.
    pub observed: [f64; 2],
    /// Expected events per group under the null hypothesis.
    pub expected: [f64; 2],
}

impl LogRankTest {
    pub const DEGREES_OF_FREEDOM: f64 = 1.0;

    /// `-log2(p)`, the surprisal of the p-value in bits.
    #[must_use]
    pub fn neg_log2_p(&self) -> f64 {
        -self.p_value.log2()
    }
}

/// Runs the log-rank test between two groups of observations.
///
/// Returns `None` when the test is undefined: either group is empty, there
/// are no events at all, or the variance of the statistic is zero.
///
/// # Examples
///
/// ```
/// use oncosurv_stats::{logrank::logrank_test, survival::Observation};
///
/// let early = (1..=30).map(|t| Observation::new(f64::from(t), true)).collect::<Vec<_>>();
/// let late = (1..=30).map(|t| Observation::new(f64::from(t) * 10.0, true)).collect::<Vec<_>>();
///
/// let result = logrank_test(&early, &late).unwrap();
/// assert!(result.p_value < 0.001);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn logrank_test(a: &[Observation], b: &[Observation]) -> Option<LogRankTest> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    // (duration, observed, in first group)
    let mut data = a
        .iter()
        .map(|obs| (obs, true))
        .chain(b.iter().map(|obs| (obs, false)))
        .filter(|(obs, _)| obs.duration.is_finite())
        .map(|(obs, first)| (obs.duration, obs.observed, first))
        .collect::<Vec<_>>();
    data.sort_by(|x, y| x.0.total_cmp(&y.0));

    let total = data.len();
    let mut at_risk_first = data.iter().filter(|(_, _, first)| *first).count();

    let mut observed = [0.0; 2];
    let mut expected = [0.0; 2];
    let mut variance = 0.0;

    let mut i = 0;
    while i < data.len() {
        let current_time = data[i].0;
        let n = (total - i) as f64;
        let n1 = at_risk_first as f64;

        let mut events = 0usize;
        let mut events_first = 0usize;
        let mut leaving_first = 0usize;
        let mut j = i;
        while j < data.len() && data[j].0.total_cmp(&current_time).is_eq() {
            let (_, was_observed, first) = data[j];
            if was_observed {
                events += 1;
                if first {
                    events_first += 1;
                }
            }
            if first {
                leaving_first += 1;
            }
            j += 1;
        }

        if events > 0 {
            let d = events as f64;
            let e1 = d * n1 / n;
            observed[0] += events_first as f64;
            observed[1] += (events - events_first) as f64;
            expected[0] += e1;
            expected[1] += d - e1;
            if n > 1.0 {
                variance += d * (n1 / n) * (1.0 - n1 / n) * (n - d) / (n - 1.0);
            }
        }

        at_risk_first -= leaving_first;
        i = j;
    }

    if variance <= 0.0 {
        return None;
    }

    let test_statistic = (observed[0] - expected[0]).powi(2) / variance;
    let p_value = ChiSquared::new(LogRankTest::DEGREES_OF_FREEDOM)
        .ok()?
        .sf(test_statistic);

    Some(LogRankTest {
        test_statistic,
        p_value,
        observed,
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(data: &[(f64, bool)]) -> Vec<Observation> {
        data.iter().map(|&(d, o)| Observation::new(d, o)).collect()
    }

    #[test]
    fn test_identical_groups_are_not_different() {
        let group = obs(&[(5.0, true), (8.0, true), (12.0, false), (20.0, true)]);
        let result = logrank_test(&group, &group).unwrap();
        assert!(result.test_statistic.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_known_statistic() {
        // Group A: events at 1, 2; group B: events at 3, 4.
        // t=1: n=4, n1=2, d=1 -> E1=0.5, V=0.25
        // t=2: n=3, n1=1, d=1 -> E1=1/3, V=2/9
        // t=3: n=2, n1=0 -> E1=0, V=0
        // t=4: n=1, n1=0 -> E1=0, V=0
        // O1=2, E1=5/6, V=17/36 -> chi2 = (7/6)^2 / (17/36) = 49/17
        let a = obs(&[(1.0, true), (2.0, true)]);
        let b = obs(&[(3.0, true), (4.0, true)]);
        let result = logrank_test(&a, &b).unwrap();
        assert!((result.test_statistic - 49.0 / 17.0).abs() < 1e-9);
        assert_eq!(result.observed, [2.0, 2.0]);
        assert!((result.expected[0] - 5.0 / 6.0).abs() < 1e-9);
        assert!(result.p_value > 0.05 && result.p_value < 0.1);
    }

    #[test]
    fn test_symmetric_in_group_order() {
        let a = obs(&[(1.0, true), (4.0, false), (6.0, true), (9.0, true)]);
        let b = obs(&[(2.0, true), (3.0, true), (5.0, false), (7.0, true)]);
        let ab = logrank_test(&a, &b).unwrap();
        let ba = logrank_test(&b, &a).unwrap();
        assert!((ab.test_statistic - ba.test_statistic).abs() < 1e-12);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_without_events() {
        let a = obs(&[(1.0, false), (2.0, false)]);
        let b = obs(&[(3.0, false)]);
        assert!(logrank_test(&a, &b).is_none());
        assert!(logrank_test(&a, &[]).is_none());
    }
}
