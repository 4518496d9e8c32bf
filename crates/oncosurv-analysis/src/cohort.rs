//! Cohort construction from raw clinical records
//!
//! [`build_cohort`] turns a raw [`RecordTable`] into a [`Cohort`]: a cleaned
//! table plus one [`PatientRecord`] per remaining row. The steps run in a
//! fixed order and each is exposed as its own function:
//!
//! 1. [`prune_sparse_columns`]: drop columns made almost entirely of
//!    sentinel markers
//! 2. [`normalize_sentinels`]: sentinel markers become [`Value::Missing`]
//! 3. [`coerce_numeric_column`] on the age column
//! 4. [`derive_event_flag`]: vital status becomes `1` (dead) or `0`
//! 5. [`drop_columns`] for the configured uninformative columns
//! 6. [`coerce_numeric_column`] on both time columns
//! 7. [`apply_patches`](crate::patch::apply_patches) for known bad records
//! 8. [`backfill_column`]: days-to-death falls back to last follow-up
//! 9. [`drop_incomplete_rows`]: rows still lacking days-to-death are removed
//!
//! Individual malformed values never abort the build; they degrade to
//! missing. Only a missing required column is an error.
//!
//! # Example
//!
//! ```
//! use oncosurv_analysis::{
//!     cohort::{CohortConfig, build_cohort},
//!     table::RecordTable,
//! };
//!
//! let tsv = "case_id\tage_at_index\tvital_status\ttumor_stage\t\
//!            days_to_death\tdays_to_last_follow_up\n\
//!            p1\t61\tDead\tstage i\t400\t'--\n\
//!            p2\t'--\tAlive\tstage iv\t'--\t1200\n\
//!            p3\t55\t'--\tstage i\t'--\t'--\n";
//! let table = RecordTable::from_reader(tsv.as_bytes()).unwrap();
//! let cohort = build_cohort(&table, &CohortConfig::default()).unwrap();
//!
//! // p3 has neither a death nor a follow-up time
//! assert_eq!(cohort.len(), 2);
//! assert!(cohort.patients()[0].deceased);
//! assert_eq!(cohort.patients()[1].days_to_death, 1200.0);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    patch::{PatchReport, RecordPatch, apply_patches},
    table::{RecordTable, Value},
};

/// Vital status label that marks an observed death.
pub const DEAD: &str = "Dead";
/// Vital status assumed when none is recorded.
pub const ALIVE: &str = "Alive";

/// Column names the cohort builder reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortColumns {
    pub case_id: String,
    pub age: String,
    pub ethnicity: String,
    pub gender: String,
    pub race: String,
    pub vital_status: String,
    pub tumor_stage: String,
    pub days_to_death: String,
    pub days_to_last_follow_up: String,
}

impl Default for CohortColumns {
    fn default() -> Self {
        Self {
            case_id: "case_id".to_owned(),
            age: "age_at_index".to_owned(),
            ethnicity: "ethnicity".to_owned(),
            gender: "gender".to_owned(),
            race: "race".to_owned(),
            vital_status: "vital_status".to_owned(),
            tumor_stage: "tumor_stage".to_owned(),
            days_to_death: "days_to_death".to_owned(),
            days_to_last_follow_up: "days_to_last_follow_up".to_owned(),
        }
    }
}

impl CohortColumns {
    /// Columns without which no cohort can be built. They are never pruned.
    #[must_use]
    pub fn required(&self) -> [&str; 5] {
        [
            &self.case_id,
            &self.vital_status,
            &self.tumor_stage,
            &self.days_to_death,
            &self.days_to_last_follow_up,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    pub columns: CohortColumns,
    /// Markers meaning "value withheld or not reported".
    pub sentinels: Vec<String>,
    /// Fraction of sentinel values at or above which a column is pruned.
    pub sparse_column_threshold: f64,
    /// Columns always removed when present.
    pub dropped_columns: Vec<String>,
    pub patches: Vec<RecordPatch>,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            columns: CohortColumns::default(),
            sentinels: vec!["'--".to_owned(), "not reported".to_owned()],
            sparse_column_threshold: 0.9,
            dropped_columns: vec![
                "ajcc_staging_system_edition".to_owned(),
                "icd_10_code".to_owned(),
                "days_to_diagnosis".to_owned(),
            ],
            patches: vec![],
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CohortError {
    #[display("Required column '{column}' is missing from the input table")]
    MissingColumn { column: String },
}

/// One patient of a cleaned cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub case_id: String,
    pub age: Option<f64>,
    pub ethnicity: Option<Arc<str>>,
    pub gender: Option<Arc<str>>,
    pub race: Option<Arc<str>>,
    pub tumor_stage: Option<Arc<str>>,
    /// `true` if the death was observed, `false` if right-censored.
    pub deceased: bool,
    /// Days to death if deceased, otherwise days to last follow-up.
    pub days_to_death: f64,
}

/// Summary of what [`build_cohort`] did to the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CohortReport {
    pub input_rows: usize,
    pub input_columns: usize,
    pub pruned_columns: Vec<String>,
    pub normalized_values: usize,
    pub unparseable_values: usize,
    pub dropped_columns: Vec<String>,
    pub patches: PatchReport,
    pub backfilled: usize,
    pub excluded_rows: usize,
}

/// A cleaned table and its patients, row `i` of the table being patient `i`.
#[derive(Debug, Clone)]
pub struct Cohort {
    table: RecordTable,
    patients: Vec<PatientRecord>,
    report: CohortReport,
}

impl Cohort {
    #[must_use]
    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    #[must_use]
    pub fn patients(&self) -> &[PatientRecord] {
        &self.patients
    }

    /// Report of the build that produced this cohort.
    #[must_use]
    pub fn report(&self) -> &CohortReport {
        &self.report
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Returns the sub-cohort of patients matching `keep`, table rows and
    /// patients filtered together.
    #[must_use]
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&PatientRecord) -> bool,
    {
        let mask = self.patients.iter().map(&mut keep).collect::<Vec<_>>();
        let mut table = self.table.clone();
        let mut row_mask = mask.iter();
        table.retain_rows(|_| row_mask.next().copied().unwrap_or(false));
        let patients = self
            .patients
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| **keep)
            .map(|(patient, _)| patient.clone())
            .collect();
        Self {
            table,
            patients,
            report: self.report.clone(),
        }
    }
}

/// Cleans `table` into a cohort. The input is not modified.
pub fn build_cohort(table: &RecordTable, config: &CohortConfig) -> Result<Cohort, CohortError> {
    let columns = &config.columns;
    let required = columns.required();
    if let Some(column) = required.iter().find(|column| !table.has_column(column)) {
        return Err(CohortError::MissingColumn {
            column: (*column).to_owned(),
        });
    }

    let mut table = table.clone();
    let mut report = CohortReport {
        input_rows: table.num_rows(),
        input_columns: table.num_columns(),
        ..CohortReport::default()
    };
    info!(
        rows = report.input_rows,
        columns = report.input_columns,
        "building cohort"
    );

    report.pruned_columns = prune_sparse_columns(
        &mut table,
        &config.sentinels,
        config.sparse_column_threshold,
        &required,
    );
    info!(count = report.pruned_columns.len(), "pruned sparse columns");

    report.normalized_values = normalize_sentinels(&mut table, &config.sentinels);
    report.unparseable_values += coerce_numeric_column(&mut table, &columns.age);
    derive_event_flag(&mut table, &columns.vital_status);

    report.dropped_columns = drop_columns(&mut table, &config.dropped_columns);

    report.unparseable_values += coerce_numeric_column(&mut table, &columns.days_to_last_follow_up);
    report.unparseable_values += coerce_numeric_column(&mut table, &columns.days_to_death);

    report.patches = apply_patches(&mut table, &columns.case_id, &config.patches);
    info!(
        applied = report.patches.applied,
        unmatched = report.patches.unmatched_ids.len(),
        skipped = report.patches.skipped,
        "applied record patches"
    );

    report.backfilled = backfill_column(
        &mut table,
        &columns.days_to_death,
        &columns.days_to_last_follow_up,
    );
    report.excluded_rows = drop_incomplete_rows(&mut table, &columns.days_to_death);
    info!(
        backfilled = report.backfilled,
        excluded = report.excluded_rows,
        "filled time-to-event"
    );

    let patients = PatientColumns::new(&table, columns).extract(&table);
    info!(patients = patients.len(), "cohort built");

    Ok(Cohort {
        table,
        patients,
        report,
    })
}

fn is_sentinel(value: &Value, sentinels: &[String]) -> bool {
    value
        .as_text()
        .is_some_and(|text| sentinels.iter().any(|sentinel| sentinel == text))
}

/// Drops every column whose share of sentinel values is at least
/// `threshold`, except the `protected` ones. Returns the dropped names.
///
/// An empty table drops nothing. Running it twice drops nothing the second
/// time.
#[expect(clippy::cast_precision_loss)]
pub fn prune_sparse_columns(
    table: &mut RecordTable,
    sentinels: &[String],
    threshold: f64,
    protected: &[&str],
) -> Vec<String> {
    if table.is_empty() {
        return vec![];
    }

    let limit = threshold * table.num_rows() as f64;
    let sparse = table
        .columns()
        .iter()
        .map(|name| {
            let count = table
                .column(name)
                .map_or(0, |values| values.filter(|v| is_sentinel(v, sentinels)).count());
            count as f64 >= limit
        })
        .collect::<Vec<_>>();

    table.retain_columns(|idx, name| {
        if !sparse[idx] {
            return true;
        }
        if protected.contains(&name) {
            warn!(column = name, "required column is mostly sentinel values, keeping it");
            return true;
        }
        debug!(column = name, "dropping sparse column");
        false
    })
}

/// Replaces every sentinel value with [`Value::Missing`]; returns how many
/// cells changed.
pub fn normalize_sentinels(table: &mut RecordTable, sentinels: &[String]) -> usize {
    let mut count = 0;
    table.update_all(|value| {
        if is_sentinel(value, sentinels) {
            *value = Value::Missing;
            count += 1;
        }
    });
    count
}

/// Coerces a column to numbers; unparseable values become missing. Returns
/// the number of non-missing values lost. An absent column is skipped.
pub fn coerce_numeric_column(table: &mut RecordTable, column: &str) -> usize {
    let mut lost = 0;
    let present = table.update_column(column, |value| {
        if value.coerce_numeric() {
            lost += 1;
        }
    });
    if !present {
        debug!(column, "column absent, numeric coercion skipped");
    } else if lost > 0 {
        debug!(column, lost, "unparseable values set to missing");
    }
    lost
}

/// Maps the vital status column to `1` for [`DEAD`] and `0` otherwise, a
/// missing status counting as [`ALIVE`].
pub fn derive_event_flag(table: &mut RecordTable, column: &str) {
    table.update_column(column, |value| {
        let status = value.as_text().unwrap_or(ALIVE);
        let flag = if status == DEAD { 1.0 } else { 0.0 };
        *value = Value::Number(flag);
    });
}

/// Drops the named columns that are present; returns the ones dropped.
pub fn drop_columns(table: &mut RecordTable, names: &[String]) -> Vec<String> {
    table.retain_columns(|_, name| !names.iter().any(|dropped| dropped == name))
}

/// Fills missing values of `target` from `source` in the same row; returns
/// the number of cells filled.
pub fn backfill_column(table: &mut RecordTable, target: &str, source: &str) -> usize {
    let (Some(target_idx), Some(source_idx)) =
        (table.column_index(target), table.column_index(source))
    else {
        return 0;
    };
    let mut filled = 0;
    for row_idx in 0..table.num_rows() {
        let Some(row) = table.row_mut(row_idx) else {
            continue;
        };
        if row[target_idx].is_missing() && !row[source_idx].is_missing() {
            row[target_idx] = row[source_idx].clone();
            filled += 1;
        }
    }
    filled
}

/// Removes rows whose `column` has no numeric value; returns how many.
pub fn drop_incomplete_rows(table: &mut RecordTable, column: &str) -> usize {
    let Some(idx) = table.column_index(column) else {
        return 0;
    };
    table.retain_rows(|row| row[idx].as_number().is_some())
}

fn label(value: &Value) -> Option<Arc<str>> {
    match value {
        Value::Missing => None,
        Value::Text(text) => Some(Arc::from(text.as_str())),
        Value::Number(_) => Some(Arc::from(value.to_string())),
    }
}

/// Column positions of the patient fields in a cleaned table.
struct PatientColumns {
    case_id: Option<usize>,
    age: Option<usize>,
    ethnicity: Option<usize>,
    gender: Option<usize>,
    race: Option<usize>,
    vital_status: Option<usize>,
    tumor_stage: Option<usize>,
    days_to_death: Option<usize>,
}

impl PatientColumns {
    fn new(table: &RecordTable, columns: &CohortColumns) -> Self {
        Self {
            case_id: table.column_index(&columns.case_id),
            age: table.column_index(&columns.age),
            ethnicity: table.column_index(&columns.ethnicity),
            gender: table.column_index(&columns.gender),
            race: table.column_index(&columns.race),
            vital_status: table.column_index(&columns.vital_status),
            tumor_stage: table.column_index(&columns.tumor_stage),
            days_to_death: table.column_index(&columns.days_to_death),
        }
    }

    /// One patient per row. Rows must already have a numeric days-to-death.
    fn extract(&self, table: &RecordTable) -> Vec<PatientRecord> {
        table
            .rows()
            .iter()
            .map(|row| {
                let cell = |idx: Option<usize>| idx.map_or(&Value::Missing, |idx| &row[idx]);
                PatientRecord {
                    case_id: cell(self.case_id).to_string(),
                    age: cell(self.age).as_number(),
                    ethnicity: label(cell(self.ethnicity)),
                    gender: label(cell(self.gender)),
                    race: label(cell(self.race)),
                    tumor_stage: label(cell(self.tumor_stage)),
                    deceased: cell(self.vital_status)
                        .as_number()
                        .is_some_and(|flag| flag > 0.5),
                    days_to_death: cell(self.days_to_death).as_number().unwrap_or(f64::NAN),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchAction;

    const HEADER: &str = "case_id\tage_at_index\tethnicity\tgender\trace\tvital_status\t\
        tumor_stage\tdays_to_death\tdays_to_last_follow_up\ticd_10_code";

    fn table(rows: &[&str]) -> RecordTable {
        let mut tsv = String::from(HEADER);
        for row in rows {
            tsv.push('\n');
            tsv.push_str(row);
        }
        tsv.push('\n');
        RecordTable::from_reader(tsv.as_bytes()).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|&v| v.to_owned()).collect()
    }

    #[test]
    fn test_every_patient_has_time_and_binary_flag() {
        let input = table(&[
            "a\t50\tnot hispanic or latino\tmale\twhite\tDead\tstage i\t100\t'--\tC34.1",
            "b\tabc\t'--\tfemale\tasian\tAlive\tstage iv\t'--\t300\tC34.1",
            "c\t'--\tnot reported\tfemale\twhite\t'--\tstage i\t'--\tunknown\tC34.1",
            "d\t71\tnot reported\tmale\twhite\tsomething\tstage iia\t'--\t-12\tC34.1",
        ]);
        let cohort = build_cohort(&input, &CohortConfig::default()).unwrap();

        assert_eq!(cohort.len(), 3);
        assert_eq!(cohort.table().num_rows(), 3);
        for row in cohort.table().column("days_to_death").unwrap() {
            assert!(matches!(row, Value::Number(_)));
        }
        for flag in cohort.table().column("vital_status").unwrap() {
            assert!(*flag == Value::Number(0.0) || *flag == Value::Number(1.0));
        }
        assert_eq!(cohort.report().excluded_rows, 1);
        assert_eq!(cohort.report().dropped_columns, strings(&["icd_10_code"]));
        assert_eq!(cohort.patients()[1].age, None);
        assert_eq!(cohort.patients()[1].ethnicity, None);
    }

    #[test]
    fn test_missing_vital_status_means_alive() {
        let input = table(&["a\t50\tx\tmale\twhite\t\tstage i\t\t30\tC34"]);
        let cohort = build_cohort(&input, &CohortConfig::default()).unwrap();
        assert!(!cohort.patients()[0].deceased);
        assert_eq!(cohort.table().get(0, "vital_status"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn test_input_table_is_not_mutated() {
        let input = table(&["a\t50\tx\tmale\twhite\tDead\tstage i\t100\t'--\tC34"]);
        let before = input.clone();
        let _cohort = build_cohort(&input, &CohortConfig::default()).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_missing_required_column_is_an_error() {
        let input =
            RecordTable::from_reader("case_id\tvital_status\nx\tDead\n".as_bytes()).unwrap();
        let err = build_cohort(&input, &CohortConfig::default()).unwrap_err();
        assert!(matches!(err, CohortError::MissingColumn { column } if column == "tumor_stage"));
    }

    #[test]
    fn test_sparse_column_scenario() {
        // 1000 rows: `mostly_empty` is 95% sentinel, `partly_empty` 85%.
        let rows = (0..1000)
            .map(|i| {
                let a = if i < 950 { Value::Text("'--".to_owned()) } else { Value::Number(1.0) };
                let b = if i < 850 {
                    Value::Text("not reported".to_owned())
                } else {
                    Value::Text("x".to_owned())
                };
                vec![a, b]
            })
            .collect();
        let mut table =
            RecordTable::new(strings(&["mostly_empty", "partly_empty"]), rows).unwrap();
        let sentinels = CohortConfig::default().sentinels;

        let dropped = prune_sparse_columns(&mut table, &sentinels, 0.9, &[]);
        assert_eq!(dropped, strings(&["mostly_empty"]));
        assert_eq!(table.columns(), ["partly_empty"]);

        // idempotent
        assert!(prune_sparse_columns(&mut table, &sentinels, 0.9, &[]).is_empty());

        assert_eq!(normalize_sentinels(&mut table, &sentinels), 850);
        assert_eq!(table.get(0, "partly_empty"), Some(&Value::Missing));
        assert_eq!(table.get(999, "partly_empty"), Some(&Value::Text("x".to_owned())));
    }

    #[test]
    fn test_empty_table_prunes_nothing() {
        let mut table = RecordTable::new(strings(&["a", "b"]), vec![]).unwrap();
        let dropped = prune_sparse_columns(&mut table, &strings(&["'--"]), 0.9, &[]);
        assert!(dropped.is_empty());
        assert_eq!(table.num_columns(), 2);
    }

    #[test]
    fn test_protected_columns_survive_pruning() {
        let input = table(&[
            "a\t50\tx\tmale\twhite\tDead\t'--\t100\t'--\tC34",
            "b\t60\tx\tmale\twhite\tDead\t'--\t200\t'--\tC34",
        ]);
        let cohort = build_cohort(&input, &CohortConfig::default()).unwrap();
        assert!(cohort.table().has_column("tumor_stage"));
        assert!(cohort.table().has_column("days_to_last_follow_up"));
        assert!(cohort.patients().iter().all(|p| p.tumor_stage.is_none()));
    }

    #[test]
    fn test_patches_run_before_backfill() {
        let input = table(&[
            "a\t50\tx\tmale\twhite\tDead\tstage i\t'--\t'--\tC34",
            "b\t60\tx\tmale\twhite\tAlive\tstage i\t'--\t-45\tC34",
        ]);
        let config = CohortConfig {
            patches: vec![
                RecordPatch::new("a", "days_to_death", PatchAction::Set(0.0)),
                RecordPatch::new("b", "days_to_last_follow_up", PatchAction::Absolute),
            ],
            ..CohortConfig::default()
        };
        let cohort = build_cohort(&input, &config).unwrap();

        assert_eq!(cohort.len(), 2);
        assert_eq!(cohort.patients()[0].days_to_death, 0.0);
        assert_eq!(cohort.patients()[1].days_to_death, 45.0);
        assert_eq!(cohort.report().backfilled, 1);
    }

    #[test]
    fn test_zero_padded_and_decimal_ids_are_patched() {
        let input = table(&[
            "007\t50\tx\tmale\twhite\tDead\tstage i\t'--\t'--\tC34",
            "1.50\t60\tx\tmale\twhite\tAlive\tstage i\t'--\t-40\tC34",
        ]);
        let config = CohortConfig {
            patches: vec![
                RecordPatch::new("007", "days_to_death", PatchAction::Set(0.0)),
                RecordPatch::new("1.50", "days_to_last_follow_up", PatchAction::Absolute),
            ],
            ..CohortConfig::default()
        };
        let cohort = build_cohort(&input, &config).unwrap();

        assert!(cohort.report().patches.unmatched_ids.is_empty());
        let patients = cohort
            .patients()
            .iter()
            .map(|p| (p.case_id.as_str(), p.days_to_death))
            .collect::<Vec<_>>();
        assert_eq!(patients, [("007", 0.0), ("1.50", 40.0)]);

        let mut out = vec![];
        cohort.table().write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).is_some_and(|line| line.starts_with("007\t")));
        assert!(text.lines().nth(2).is_some_and(|line| line.starts_with("1.50\t")));
    }

    #[test]
    fn test_filter_keeps_table_and_patients_in_lockstep() {
        let input = table(&[
            "a\t50\tx\tmale\twhite\tDead\tstage i\t100\t'--\tC34",
            "b\t60\tx\tmale\twhite\tAlive\tstage iv\t'--\t300\tC34",
            "c\t70\tx\tmale\twhite\tAlive\tstage i\t'--\t500\tC34",
        ]);
        let cohort = build_cohort(&input, &CohortConfig::default()).unwrap();
        let stage_i = cohort.filter(|p| p.tumor_stage.as_deref() == Some("stage i"));

        assert_eq!(stage_i.len(), 2);
        assert_eq!(stage_i.table().num_rows(), 2);
        for (idx, patient) in stage_i.patients().iter().enumerate() {
            assert_eq!(
                stage_i.table().get(idx, "case_id"),
                Some(&Value::Text(patient.case_id.clone()))
            );
        }
    }
}
