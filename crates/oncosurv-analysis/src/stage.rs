//! Survival comparison between tumor stages
//!
//! [`compare_stages`] keeps the stages with enough patients, orders them by
//! clinical severity, runs a [`PairwiseTest`] over the remaining patients and
//! arranges the p-values into a lower-triangular [`PairwiseMatrix`].

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    cohort::Cohort,
    pairwise::{LabeledObservation, PairwiseResults, PairwiseTest},
    survival::SurvivalStatsMap,
};

/// Clinical severity ranking of tumor stage labels, least severe first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageOrder {
    labels: Vec<String>,
}

impl Default for StageOrder {
    fn default() -> Self {
        Self::new(["stage i", "stage iia", "stage iiib", "stage iiic", "stage iv"])
    }
}

impl StageOrder {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Rank of a label, `None` if the ranking does not know it.
    #[must_use]
    pub fn rank(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|ranked| ranked == label)
    }

    /// Sorts labels by rank; fails on the first label without one.
    pub fn sort(&self, labels: Vec<Arc<str>>) -> Result<Vec<Arc<str>>, ComparisonError> {
        let mut ranked = labels
            .into_iter()
            .map(|label| match self.rank(&label) {
                Some(rank) => Ok((rank, label)),
                None => Err(ComparisonError::UnrankedStage {
                    label: label.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        ranked.sort_by_key(|(rank, _)| *rank);
        Ok(ranked.into_iter().map(|(_, label)| label).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Smallest stage group that takes part in the comparison.
    pub min_group_size: usize,
    pub stage_order: StageOrder,
    /// p-values below this are reported as significant.
    pub significance_threshold: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            min_group_size: 60,
            stage_order: StageOrder::default(),
            significance_threshold: 0.05,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ComparisonError {
    #[display("Tumor stage '{label}' has no rank in the configured stage order")]
    UnrankedStage { label: String },
}

/// Square matrix of pairwise p-values over ordered labels.
///
/// Cell `(i, j)` with `j < i` holds the p-value for `{labels[i], labels[j]}`.
/// The diagonal, the upper triangle and pairs without a result are `NaN`.
#[derive(Debug, Clone)]
pub struct PairwiseMatrix {
    labels: Vec<Arc<str>>,
    cells: Vec<f64>,
}

impl PairwiseMatrix {
    #[must_use]
    pub fn from_results(labels: Vec<Arc<str>>, results: &PairwiseResults) -> Self {
        let n = labels.len();
        let mut cells = vec![f64::NAN; n * n];
        for i in 0..n {
            for j in 0..i {
                if let Some(result) = results.get(&labels[i], &labels[j]) {
                    cells[i * n + j] = result.p_value;
                }
            }
        }
        Self { labels, cells }
    }

    #[must_use]
    pub fn labels(&self) -> &[Arc<str>] {
        &self.labels
    }

    /// Number of rows (and columns).
    #[must_use]
    pub fn size(&self) -> usize {
        self.labels.len()
    }

    /// # Panics
    ///
    /// Panics if `row` or `column` is out of range.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        let n = self.size();
        assert!(row < n && column < n, "matrix index out of range");
        self.cells[row * n + column]
    }

    /// Iterates the defined lower-triangle cells as `(row, column, p_value)`.
    pub fn defined_cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.size();
        (0..n)
            .flat_map(move |i| (0..i).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, self.get(i, j)))
            .filter(|(_, _, p)| !p.is_nan())
    }

    /// Bit-level equality, `NaN` cells included.
    #[must_use]
    pub fn bitwise_eq(&self, other: &Self) -> bool {
        self.labels == other.labels
            && self.cells.len() == other.cells.len()
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

/// Outcome of [`compare_stages`].
#[derive(Debug, Clone)]
pub struct StageComparison {
    /// Patients of the retained stages only.
    pub cohort: Cohort,
    pub matrix: PairwiseMatrix,
    /// Retained stages in clinical order.
    pub labels: Vec<Arc<str>>,
    pub results: PairwiseResults,
    /// Kaplan-Meier statistics per retained stage.
    pub survival: SurvivalStatsMap<Arc<str>>,
    /// Patient count of every stage seen, retained or not.
    pub stage_counts: BTreeMap<Arc<str>, usize>,
}

/// Compares survival between the tumor stages of `cohort` with at least
/// `min_group_size` patients.
///
/// Fails with [`ComparisonError::UnrankedStage`] before running any test if a
/// retained stage is missing from the configured order.
pub fn compare_stages<T>(
    cohort: &Cohort,
    config: &ComparisonConfig,
    test: &T,
) -> Result<StageComparison, ComparisonError>
where
    T: PairwiseTest + ?Sized,
{
    let mut stage_counts = BTreeMap::<Arc<str>, usize>::new();
    for stage in cohort.patients().iter().filter_map(|p| p.tumor_stage.as_ref()) {
        *stage_counts.entry(Arc::clone(stage)).or_default() += 1;
    }

    let retained = stage_counts
        .iter()
        .filter(|(_, count)| **count >= config.min_group_size)
        .map(|(label, _)| Arc::clone(label))
        .collect::<Vec<_>>();
    for (label, count) in &stage_counts {
        if *count < config.min_group_size {
            debug!(stage = %label, count, "stage group too small, excluded");
        }
    }

    let labels = config.stage_order.sort(retained)?;
    info!(stages = labels.len(), min_group_size = config.min_group_size, "retained stage groups");

    let filtered = cohort.filter(|p| {
        p.tumor_stage
            .as_ref()
            .is_some_and(|stage| labels.contains(stage))
    });

    let data = filtered
        .patients()
        .iter()
        .filter_map(|p| {
            p.tumor_stage.as_ref().map(|stage| LabeledObservation {
                label: Arc::clone(stage),
                observation: p.observation(),
            })
        })
        .collect::<Vec<_>>();
    let results = test.compare(&data);
    info!(test = test.name(), pairs = results.len(), "ran pairwise test");

    let matrix = PairwiseMatrix::from_results(labels.clone(), &results);
    let survival =
        SurvivalStatsMap::collect_by_group(filtered.patients(), |p| p.tumor_stage.clone());

    Ok(StageComparison {
        cohort: filtered,
        matrix,
        labels,
        results,
        survival,
        stage_counts,
    })
}
