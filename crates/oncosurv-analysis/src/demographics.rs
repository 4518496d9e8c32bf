//! Demographic summaries of a cohort
//!
//! Read-only distribution summaries over age, gender, ethnicity and race.

use std::{collections::BTreeMap, sync::Arc};

use oncosurv_stats::{
    descriptive::DescriptiveStats, histogram::Histogram, kde::GaussianKde,
    percentiles::Percentiles,
};

use crate::cohort::PatientRecord;

/// Number of equal-width bins in the age histogram.
pub const AGE_HISTOGRAM_BINS: usize = 20;

/// Positions at which the age density curve is evaluated.
pub const AGE_DENSITY_POINTS: usize = 200;

/// Percentiles reported for age.
pub const AGE_QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Occurrences of each category label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCounts {
    pub counts: BTreeMap<Arc<str>, usize>,
    /// Patients without a value.
    pub missing: usize,
}

impl CategoryCounts {
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a Arc<str>>>,
    {
        let mut counts = Self::default();
        for value in values {
            match value {
                Some(label) => *counts.counts.entry(Arc::clone(label)).or_default() += 1,
                None => counts.missing += 1,
            }
        }
        counts
    }

    /// Labels by descending count, ties in label order.
    #[must_use]
    pub fn by_count(&self) -> Vec<(&str, usize)> {
        let mut sorted = self
            .counts
            .iter()
            .map(|(label, count)| (&**label, *count))
            .collect::<Vec<_>>();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        sorted
    }

    /// Patients with a value.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeSummary {
    /// `None` when no patient has an age.
    pub stats: Option<DescriptiveStats>,
    pub quartiles: Percentiles,
    pub histogram: Histogram,
    /// Kernel density of age over the histogram range, scaled to bin counts.
    /// Empty when fewer than two distinct ages are known.
    pub density: Vec<(f64, f64)>,
    pub missing: usize,
}

impl AgeSummary {
    fn from_patients(patients: &[PatientRecord]) -> Self {
        let mut ages = patients.iter().filter_map(|p| p.age).collect::<Vec<_>>();
        ages.sort_by(f64::total_cmp);
        let histogram = Histogram::new(ages.iter().copied(), AGE_HISTOGRAM_BINS, None);
        Self {
            stats: DescriptiveStats::from_sorted(&ages),
            quartiles: Percentiles::from_sorted(&ages, &AGE_QUARTILES),
            density: count_density(&ages, &histogram),
            histogram,
            missing: patients.len() - ages.len(),
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn count_density(ages: &[f64], histogram: &Histogram) -> Vec<(f64, f64)> {
    let (Some(first), Some(last)) = (histogram.bins.first(), histogram.bins.last()) else {
        return vec![];
    };
    let Some(kde) = GaussianKde::new(ages.iter().copied()) else {
        return vec![];
    };
    let scale = ages.len() as f64 * (first.range.end - first.range.start);
    kde.evaluate(first.range.start..last.range.end, AGE_DENSITY_POINTS)
        .into_iter()
        .map(|(x, d)| (x, d * scale))
        .collect()
}

/// Distribution summaries of a cohort's demographics.
#[derive(Debug, Clone, PartialEq)]
pub struct DemographicSummary {
    pub patients: usize,
    pub age: AgeSummary,
    pub gender: CategoryCounts,
    pub ethnicity: CategoryCounts,
    pub race: CategoryCounts,
}

impl DemographicSummary {
    #[must_use]
    pub fn from_patients(patients: &[PatientRecord]) -> Self {
        Self {
            patients: patients.len(),
            age: AgeSummary::from_patients(patients),
            gender: CategoryCounts::from_values(patients.iter().map(|p| p.gender.as_ref())),
            ethnicity: CategoryCounts::from_values(patients.iter().map(|p| p.ethnicity.as_ref())),
            race: CategoryCounts::from_values(patients.iter().map(|p| p.race.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(age: Option<f64>, gender: Option<&str>, race: Option<&str>) -> PatientRecord {
        PatientRecord {
            case_id: String::new(),
            age,
            ethnicity: None,
            gender: gender.map(Arc::from),
            race: race.map(Arc::from),
            tumor_stage: None,
            deceased: false,
            days_to_death: 1.0,
        }
    }

    #[test]
    fn test_summary_counts_categories_and_missing() {
        let patients = vec![
            patient(Some(40.0), Some("female"), Some("white")),
            patient(Some(60.0), Some("male"), None),
            patient(None, Some("female"), Some("asian")),
            patient(Some(80.0), None, Some("white")),
        ];
        let before = patients.clone();
        let summary = DemographicSummary::from_patients(&patients);
        assert_eq!(patients, before);

        assert_eq!(summary.patients, 4);
        assert_eq!(summary.age.missing, 1);
        assert_eq!(summary.age.stats.as_ref().unwrap().median, 60.0);
        assert_eq!(summary.age.histogram.total(), 3);
        assert_eq!(summary.age.histogram.bins.len(), AGE_HISTOGRAM_BINS);

        assert_eq!(summary.gender.by_count(), vec![("female", 2), ("male", 1)]);
        assert_eq!(summary.gender.missing, 1);
        assert_eq!(summary.race.total(), 3);
        assert_eq!(summary.ethnicity.missing, 4);
    }

    #[test]
    fn test_empty_cohort() {
        let summary = DemographicSummary::from_patients(&[]);
        assert!(summary.age.stats.is_none());
        assert!(summary.age.histogram.bins.is_empty());
        assert!(summary.gender.counts.is_empty());
    }

    #[test]
    fn test_age_density_is_scaled_to_counts() {
        let patients = (40..=80)
            .map(|age| patient(Some(f64::from(age)), None, None))
            .collect::<Vec<_>>();
        let age = DemographicSummary::from_patients(&patients).age;

        assert_eq!(age.density.len(), AGE_DENSITY_POINTS);
        let bins = &age.histogram.bins;
        assert_eq!(age.density[0].0, bins[0].range.start);
        let last_edge = bins[bins.len() - 1].range.end;
        assert!((age.density[AGE_DENSITY_POINTS - 1].0 - last_edge).abs() < 1e-9);
        assert!(age.density.iter().all(|(_, d)| *d > 0.0));

        // Integrating over the range recovers most of the 41 patients, in bin-width units.
        let bin_width = bins[0].range.end - bins[0].range.start;
        let dx = age.density[1].0 - age.density[0].0;
        let mass = age.density.iter().map(|(_, d)| d * dx).sum::<f64>() / bin_width;
        assert!((30.0..=42.0).contains(&mass), "mass = {mass}");
    }

    #[test]
    fn test_age_density_needs_distinct_ages() {
        let patients = vec![patient(Some(50.0), None, None), patient(Some(50.0), None, None)];
        let age = DemographicSummary::from_patients(&patients).age;
        assert_eq!(age.histogram.total(), 2);
        assert!(age.density.is_empty());
    }
}
