use chrono::{DateTime, Utc};
use oncosurv_analysis::cohort::CohortReport;
use serde::{Deserialize, Serialize};

/// Machine-readable result of the `survival` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivalSummary {
    /// Timestamp when the summary was generated (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    /// Path of the clinical records file
    pub input: String,
    /// Smallest stage group included in the comparison
    pub min_group_size: usize,
    /// p-values below this are flagged significant
    pub significance_threshold: f64,
    /// Patients in the retained stage groups
    pub patients: usize,
    /// Retained stages in clinical order
    pub stages: Vec<StageSummary>,
    /// One entry per tested stage pair
    pub pairs: Vec<PairSummary>,
    /// What cleaning did to the input
    pub cohort: CohortSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    pub label: String,
    pub patients: usize,
    pub censored: usize,
    pub median_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairSummary {
    pub stage_a: String,
    pub stage_b: String,
    pub test_statistic: f64,
    pub p_value: f64,
    pub neg_log2_p: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSummary {
    pub input_rows: usize,
    /// Rows of the built cohort, before small stage groups are removed
    pub cohort_rows: usize,
    pub pruned_columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub patches_applied: usize,
    pub unmatched_patch_ids: Vec<String>,
    pub backfilled: usize,
    pub excluded_rows: usize,
}

impl CohortSummary {
    pub fn new(report: &CohortReport, cohort_rows: usize) -> Self {
        Self {
            input_rows: report.input_rows,
            cohort_rows,
            pruned_columns: report.pruned_columns.clone(),
            dropped_columns: report.dropped_columns.clone(),
            patches_applied: report.patches.applied,
            unmatched_patch_ids: report.patches.unmatched_ids.clone(),
            backfilled: report.backfilled,
            excluded_rows: report.excluded_rows,
        }
    }
}
