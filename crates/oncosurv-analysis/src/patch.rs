//! Known-record corrections applied by identifier
//!
//! Some source records carry data-entry errors that are fixed by hand. Each
//! fix names the record by its stable identifier and the field to change, so
//! a correction never lands on the wrong row when the input is reordered or
//! filtered.
//!
//! # Example
//!
//! ```
//! use oncosurv_analysis::{
//!     patch::{PatchAction, RecordPatch, apply_patches},
//!     table::{RecordTable, Value},
//! };
//!
//! let tsv = "case_id\tdays_to_last_follow_up\nc1\t-35\nc2\t90\n";
//! let mut table = RecordTable::from_reader(tsv.as_bytes()).unwrap();
//!
//! let patches = [RecordPatch::new("c1", "days_to_last_follow_up", PatchAction::Absolute)];
//! let report = apply_patches(&mut table, "case_id", &patches);
//!
//! assert_eq!(report.applied, 1);
//! assert_eq!(table.get(0, "days_to_last_follow_up"), Some(&Value::Number(35.0)));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::table::{RecordTable, Value};

/// What to do with the patched field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchAction {
    /// Overwrite the field with a number.
    Set(f64),
    /// Replace a numeric field with its absolute value.
    Absolute,
}

/// A correction for one field of the record(s) with a given identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub case_id: String,
    pub field: String,
    pub action: PatchAction,
}

impl RecordPatch {
    #[must_use]
    pub fn new(case_id: impl Into<String>, field: impl Into<String>, action: PatchAction) -> Self {
        Self {
            case_id: case_id.into(),
            field: field.into(),
            action,
        }
    }
}

/// Outcome of [`apply_patches`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatchReport {
    /// Number of cells changed.
    pub applied: usize,
    /// Identifiers that matched no row.
    pub unmatched_ids: Vec<String>,
    /// Patches that matched a row but could not be applied (absent field, or
    /// a non-numeric value for [`PatchAction::Absolute`]).
    pub skipped: usize,
}

/// Applies every patch to all rows whose `id_column` equals the patch id.
///
/// Never fails: unknown identifiers, absent fields and values an action
/// cannot handle are counted in the report and logged.
pub fn apply_patches(
    table: &mut RecordTable,
    id_column: &str,
    patches: &[RecordPatch],
) -> PatchReport {
    let mut report = PatchReport::default();
    let Some(id_idx) = table.column_index(id_column) else {
        warn!(column = id_column, "identifier column absent, no patch applied");
        report
            .unmatched_ids
            .extend(patches.iter().map(|patch| patch.case_id.clone()));
        return report;
    };

    for patch in patches {
        let Some(field_idx) = table.column_index(&patch.field) else {
            warn!(case_id = %patch.case_id, field = %patch.field, "patched field absent, skipping");
            report.skipped += 1;
            continue;
        };

        let matching_rows = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| id_matches(&row[id_idx], &patch.case_id))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        if matching_rows.is_empty() {
            warn!(case_id = %patch.case_id, "no record with this identifier, skipping patch");
            report.unmatched_ids.push(patch.case_id.clone());
            continue;
        }

        for row_idx in matching_rows {
            let Some(row) = table.row_mut(row_idx) else {
                continue;
            };
            let cell = &mut row[field_idx];
            match patch.action {
                PatchAction::Set(number) => {
                    *cell = Value::Number(number);
                    report.applied += 1;
                }
                PatchAction::Absolute => match cell.as_number() {
                    Some(number) => {
                        *cell = Value::Number(number.abs());
                        report.applied += 1;
                    }
                    None => {
                        warn!(
                            case_id = %patch.case_id,
                            field = %patch.field,
                            "value is not numeric, cannot take absolute value"
                        );
                        report.skipped += 1;
                    }
                },
            }
            debug!(
                case_id = %patch.case_id,
                field = %patch.field,
                action = ?patch.action,
                "patched record"
            );
        }
    }

    report
}

fn id_matches(value: &Value, case_id: &str) -> bool {
    match value {
        Value::Text(text) => text == case_id,
        Value::Number(_) => value.to_string() == case_id,
        Value::Missing => false,
    }
}
