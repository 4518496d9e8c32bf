//! Pairwise group comparison tests
//!
//! A [`PairwiseTest`] takes labelled observations and compares the survival
//! of every pair of labels, producing one [`PairResult`] per unordered pair.
//! [`LogRank`] runs the two-group log-rank test for each pair.

use std::{collections::BTreeMap, sync::Arc};

use oncosurv_stats::{logrank::logrank_test, survival::Observation};
use serde::Serialize;
use tracing::debug;

/// An observation tagged with the group it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledObservation {
    pub label: Arc<str>,
    pub observation: Observation,
}

/// An unordered pair of group labels.
///
/// The labels are stored sorted, so `LabelPair::new(a, b) == LabelPair::new(b, a)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelPair {
    first: Arc<str>,
    second: Arc<str>,
}

impl LabelPair {
    #[must_use]
    pub fn new(a: Arc<str>, b: Arc<str>) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    #[must_use]
    pub fn first(&self) -> &str {
        &self.first
    }

    #[must_use]
    pub fn second(&self) -> &str {
        &self.second
    }
}

/// Result of comparing one pair of groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairResult {
    pub test_statistic: f64,
    pub p_value: f64,
}

impl PairResult {
    /// `-log2(p)`, the surprisal of the p-value in bits.
    #[must_use]
    pub fn neg_log2_p(&self) -> f64 {
        -self.p_value.log2()
    }
}

/// Test results keyed by unordered label pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairwiseResults {
    results: BTreeMap<LabelPair, PairResult>,
}

impl PairwiseResults {
    pub fn insert(&mut self, a: Arc<str>, b: Arc<str>, result: PairResult) {
        self.results.insert(LabelPair::new(a, b), result);
    }

    /// Looks up the result for `{a, b}`; argument order does not matter.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<&PairResult> {
        self.results.get(&LabelPair::new(Arc::from(a), Arc::from(b)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LabelPair, &PairResult)> + '_ {
        self.results.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// A statistical test comparing every pair of groups in a labelled dataset.
pub trait PairwiseTest {
    /// Human-readable name of the test.
    fn name(&self) -> &'static str;

    /// Runs the test once over all observations. Pairs for which the test is
    /// undefined are absent from the result.
    fn compare(&self, data: &[LabeledObservation]) -> PairwiseResults;
}

/// The two-group log-rank test applied to every pair of labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRank;

impl PairwiseTest for LogRank {
    fn name(&self) -> &'static str {
        "log-rank"
    }

    fn compare(&self, data: &[LabeledObservation]) -> PairwiseResults {
        let mut groups = BTreeMap::<Arc<str>, Vec<Observation>>::new();
        for item in data {
            groups
                .entry(Arc::clone(&item.label))
                .or_default()
                .push(item.observation);
        }

        let groups = groups.into_iter().collect::<Vec<_>>();
        let mut results = PairwiseResults::default();
        for (i, (label_a, group_a)) in groups.iter().enumerate() {
            for (label_b, group_b) in &groups[i + 1..] {
                match logrank_test(group_a, group_b) {
                    Some(test) => results.insert(
                        Arc::clone(label_a),
                        Arc::clone(label_b),
                        PairResult {
                            test_statistic: test.test_statistic,
                            p_value: test.p_value,
                        },
                    ),
                    None => debug!(a = %label_a, b = %label_b, "log-rank test undefined for pair"),
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(label: &str, duration: f64, observed: bool) -> LabeledObservation {
        LabeledObservation {
            label: Arc::from(label),
            observation: Observation::new(duration, observed),
        }
    }

    #[test]
    fn test_label_pair_is_unordered() {
        let ab = LabelPair::new(Arc::from("stage iv"), Arc::from("stage i"));
        let ba = LabelPair::new(Arc::from("stage i"), Arc::from("stage iv"));
        assert_eq!(ab, ba);
        assert_eq!(ab.first(), "stage i");
    }

    #[test]
    fn test_log_rank_covers_every_pair_once() {
        let data = [("a", 1.0), ("b", 2.0), ("c", 3.0)]
            .into_iter()
            .flat_map(|(label, scale)| {
                (1..=10).map(move |t| labeled(label, f64::from(t) * scale, t % 4 != 0))
            })
            .collect::<Vec<_>>();
        let results = LogRank.compare(&data);

        assert_eq!(results.len(), 3);
        for (x, y) in [("a", "b"), ("a", "c"), ("b", "c")] {
            let forward = results.get(x, y).unwrap();
            let backward = results.get(y, x).unwrap();
            assert_eq!(forward, backward);
            assert!((0.0..=1.0).contains(&forward.p_value));
        }
    }

    #[test]
    fn test_undefined_pairs_are_absent() {
        let data = vec![
            labeled("a", 1.0, false),
            labeled("a", 2.0, false),
            labeled("b", 3.0, false),
            labeled("c", 1.0, true),
            labeled("c", 4.0, true),
        ];
        let results = LogRank.compare(&data);
        assert!(results.get("a", "b").is_none());
        assert!(results.get("a", "c").is_some());
    }

    #[test]
    fn test_neg_log2_p() {
        let result = PairResult {
            test_statistic: 0.0,
            p_value: 0.25,
        };
        assert_eq!(result.neg_log2_p(), 2.0);
    }
}
