//! Clinical cohort construction and survival comparison
//!
//! This crate turns a raw clinical record extract into an analysis-ready
//! cohort and compares survival between tumor stages.
//!
//! # Overview
//!
//! ## Cohort Workflow
//!
//! 1. **Load Records** ([`table::RecordTable`]): Read a tab-separated extract
//! 2. **Build Cohort** ([`cohort::build_cohort`]): Prune sparse columns, normalize
//!    missing markers, derive the death-event flag, patch known bad records and
//!    fill in time-to-event
//! 3. **Summarize** ([`demographics::DemographicSummary`]): Age, gender, ethnicity
//!    and race distributions
//!
//! ## Stage Comparison Workflow
//!
//! 1. **Select Stages** ([`stage::compare_stages`]): Keep tumor stages with enough
//!    patients, in clinical order
//! 2. **Pairwise Test** ([`pairwise::LogRank`]): Log-rank test for every pair of stages
//! 3. **Matrix** ([`stage::PairwiseMatrix`]): Lower-triangular p-value matrix
//! 4. **Survival Curves** ([`survival::SurvivalStatsMap`]): Kaplan-Meier statistics
//!    per stage
//!
//! Feature importances computed by an external survival model are ranked by
//! [`importance::FeatureImportances`].
//!
//! # Example
//!
//! ```
//! use oncosurv_analysis::{
//!     cohort::{CohortConfig, build_cohort},
//!     pairwise::LogRank,
//!     stage::{ComparisonConfig, compare_stages},
//!     table::RecordTable,
//! };
//!
//! let mut tsv = String::from(
//!     "case_id\tvital_status\ttumor_stage\tdays_to_death\tdays_to_last_follow_up\n",
//! );
//! for i in 0..40 {
//!     tsv.push_str(&format!("a{i}\tDead\tstage i\t{}\t'--\n", 300 + i * 20));
//!     tsv.push_str(&format!("b{i}\tDead\tstage iv\t{}\t'--\n", 50 + i * 5));
//! }
//! let table = RecordTable::from_reader(tsv.as_bytes()).unwrap();
//! let cohort = build_cohort(&table, &CohortConfig::default()).unwrap();
//!
//! let config = ComparisonConfig { min_group_size: 30, ..ComparisonConfig::default() };
//! let comparison = compare_stages(&cohort, &config, &LogRank).unwrap();
//!
//! assert_eq!(comparison.matrix.size(), 2);
//! assert!(comparison.matrix.get(1, 0) < 0.05);
//! ```

pub mod cohort;
pub mod demographics;
pub mod importance;
pub mod pairwise;
pub mod patch;
pub mod stage;
pub mod survival;
pub mod table;
