//! Survival statistics for right-censored patient data
//!
//! Patients still alive at their last follow-up are right-censored: we know
//! they survived at least that long, but not their true survival time.
//!
//! ```text
//! Deceased:  |----x     (died 400 days after diagnosis)
//! Censored:  |------->  (alive at day 1200, true survival unknown)
//! ```
//!
//! Naive means over censored data underestimate survival. The Kaplan-Meier
//! median accounts for censoring and is the figure to compare between
//! groups; the naive figures are kept to show how large the bias is.
//!
//! # Example
//!
//! ```
//! use oncosurv_analysis::survival::SurvivalStats;
//! use oncosurv_stats::survival::Observation;
//!
//! let data = [
//!     Observation::new(45.0, true),
//!     Observation::new(500.0, false),
//!     Observation::new(123.0, true),
//!     Observation::new(500.0, false),
//! ];
//! let stats = SurvivalStats::from_observations(&data);
//!
//! assert_eq!(stats.count, 4);
//! assert_eq!(stats.censored_count, 2);
//! assert_eq!(stats.mean_complete, 84.0);
//! assert_eq!(stats.median_km, Some(123.0));
//! ```

use std::collections::BTreeMap;

use oncosurv_stats::survival::{KaplanMeierCurve, Observation};

use crate::cohort::PatientRecord;

/// Survival statistics for a group of observations
#[derive(Debug, Clone)]
pub struct SurvivalStats {
    /// Total number of observations
    pub count: usize,
    /// Number of censored observations
    pub censored_count: usize,
    /// Mean survival time of observed deaths only
    pub mean_complete: f64,
    /// Naive mean survival time of all observations
    pub mean_all: f64,
    /// Kaplan-Meier median survival time
    pub median_km: Option<f64>,
    /// Kaplan-Meier survival curve
    pub km_curve: KaplanMeierCurve,
}

#[derive(Debug, Clone)]
pub struct SurvivalStatsMap<K> {
    pub map: BTreeMap<K, SurvivalStats>,
}

impl SurvivalStats {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_observations(data: &[Observation]) -> Self {
        let count = data.len();
        let censored_count = data.iter().filter(|obs| !obs.observed).count();

        let mean = |values: Vec<f64>| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };
        let mean_complete = mean(
            data.iter()
                .filter(|obs| obs.observed)
                .map(|obs| obs.duration)
                .collect(),
        );
        let mean_all = mean(data.iter().map(|obs| obs.duration).collect());

        let km_curve = KaplanMeierCurve::from_observations(data.to_vec());
        let median_km = km_curve.median_survival();

        Self {
            count,
            censored_count,
            mean_complete,
            mean_all,
            median_km,
            km_curve,
        }
    }

    /// Percentage of censored observations.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn censoring_rate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        100.0 * self.censored_count as f64 / self.count as f64
    }
}

impl PatientRecord {
    /// The patient's time-to-event observation.
    #[must_use]
    pub fn observation(&self) -> Observation {
        Observation::new(self.days_to_death, self.deceased)
    }
}

impl<K> SurvivalStatsMap<K> {
    /// Collect survival statistics grouped by a custom key
    ///
    /// `group` computes the key of each patient; patients for which it
    /// returns `None` are left out.
    ///
    /// # Examples
    ///
    /// ```
    /// use oncosurv_analysis::{
    ///     cohort::{CohortConfig, build_cohort},
    ///     survival::SurvivalStatsMap,
    ///     table::RecordTable,
    /// };
    ///
    /// let tsv = "case_id\tvital_status\ttumor_stage\tdays_to_death\tdays_to_last_follow_up\n\
    ///            a\tDead\tstage i\t100\t'--\n\
    ///            b\tAlive\tstage i\t'--\t900\n\
    ///            c\tDead\tstage iv\t30\t'--\n";
    /// let table = RecordTable::from_reader(tsv.as_bytes()).unwrap();
    /// let cohort = build_cohort(&table, &CohortConfig::default()).unwrap();
    ///
    /// let by_stage =
    ///     SurvivalStatsMap::collect_by_group(cohort.patients(), |p| p.tumor_stage.clone());
    /// assert_eq!(by_stage.map.len(), 2);
    /// ```
    pub fn collect_by_group<F>(patients: &[PatientRecord], mut group: F) -> Self
    where
        F: FnMut(&PatientRecord) -> Option<K>,
        K: Ord,
    {
        let mut data_map: BTreeMap<K, Vec<Observation>> = BTreeMap::new();

        for patient in patients {
            if let Some(key) = group(patient) {
                data_map.entry(key).or_default().push(patient.observation());
            }
        }

        Self {
            map: data_map
                .into_iter()
                .map(|(key, data)| (key, SurvivalStats::from_observations(&data)))
                .collect(),
        }
    }

    /// Total number of observations over all groups.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.map.values().map(|stats| stats.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_censored_group() {
        let data = [Observation::new(10.0, false), Observation::new(20.0, false)];
        let stats = SurvivalStats::from_observations(&data);
        assert_eq!(stats.censoring_rate(), 100.0);
        assert_eq!(stats.mean_complete, 0.0);
        assert_eq!(stats.mean_all, 15.0);
        assert!(stats.km_curve.times.is_empty());
    }

    #[test]
    fn test_km_median_accounts_for_censoring() {
        let data = [
            Observation::new(10.0, true),
            Observation::new(20.0, false),
            Observation::new(30.0, false),
            Observation::new(40.0, true),
            Observation::new(50.0, false),
        ];
        let stats = SurvivalStats::from_observations(&data);
        // S(10) = 0.8, S(40) = 0.8 * 1/2 = 0.4
        assert_eq!(stats.median_km, Some(40.0));
        assert_eq!(stats.mean_all, 30.0);
    }

    #[test]
    fn test_empty_group() {
        let stats = SurvivalStats::from_observations(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.censoring_rate(), 0.0);
        assert_eq!(stats.median_km, None);
    }
}
