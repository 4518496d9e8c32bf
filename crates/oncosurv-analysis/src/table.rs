//! Heterogeneous record tables loaded from tab-separated files
//!
//! A [`RecordTable`] is an ordered header plus rows of [`Value`] cells. Every
//! field loads verbatim as text, or as [`Value::Missing`] for the usual "not
//! available" spellings, so identifiers such as `007` keep their spelling.
//! Cleaning steps then coerce the columns they need to numbers in place.

use std::{
    collections::BTreeSet,
    fmt, fs,
    io::{self, BufReader},
    path::Path,
};

use tracing::debug;

/// Field spellings that load as [`Value::Missing`].
pub const NA_SPELLINGS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Text(String),
    Number(f64),
}

impl Value {
    /// Parses a raw field the way the loader does.
    ///
    /// ```
    /// use oncosurv_analysis::table::Value;
    ///
    /// assert_eq!(Value::parse("NA"), Value::Missing);
    /// assert_eq!(Value::parse("007"), Value::Text("007".to_owned()));
    /// assert_eq!(Value::parse("stage i"), Value::Text("stage i".to_owned()));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if NA_SPELLINGS.contains(&raw) {
            Value::Missing
        } else {
            Value::Text(raw.to_owned())
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the cell; text is parsed, failures give `None`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Missing => None,
        }
    }

    /// Coerces the cell to a number, or to [`Value::Missing`] when it does
    /// not parse. Returns `true` if a non-missing value was lost.
    pub fn coerce_numeric(&mut self) -> bool {
        match self.as_number() {
            Some(number) => {
                *self = Value::Number(number);
                false
            }
            None => {
                let lost = !self.is_missing();
                *self = Value::Missing;
                lost
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(text) => f.write_str(text),
            Value::Number(number) => write!(f, "{number}"),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LoadTableError {
    #[display("Failed to read tab-separated table: {source}")]
    Read { source: csv::Error },
    #[display("Failed to open table file {path}: {source}")]
    Open { path: String, source: io::Error },
    #[display("Duplicate column name '{column}'")]
    DuplicateColumn { column: String },
    #[display("Row {row} has {found} fields, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// An ordered collection of rows sharing one header.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordTable {
    /// Builds a table, checking column names are unique and every row has one
    /// value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, LoadTableError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(LoadTableError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != columns.len() {
                return Err(LoadTableError::RowLength {
                    row,
                    expected: columns.len(),
                    found: values.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Reads a tab-separated table with a header row.
    ///
    /// ```
    /// use oncosurv_analysis::table::{RecordTable, Value};
    ///
    /// let tsv = "case_id\tage_at_index\nc1\t61\nc2\t'--\n";
    /// let table = RecordTable::from_reader(tsv.as_bytes()).unwrap();
    /// assert_eq!(table.num_rows(), 2);
    /// assert_eq!(table.get(1, "age_at_index"), Some(&Value::Text("'--".to_owned())));
    /// ```
    pub fn from_reader<R>(reader: R) -> Result<Self, LoadTableError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(reader);

        let columns = reader
            .headers()
            .map_err(|source| LoadTableError::Read { source })?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();

        let mut rows = vec![];
        for record in reader.records() {
            let record = record.map_err(|source| LoadTableError::Read { source })?;
            rows.push(record.iter().map(Value::parse).collect());
        }

        let table = Self::new(columns, rows)?;
        debug!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            "loaded record table"
        );
        Ok(table)
    }

    pub fn load<P>(path: P) -> Result<Self, LoadTableError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|source| LoadTableError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Writes the table as tab-separated text; missing cells are empty.
    pub fn write_tsv<W>(&self, writer: W) -> Result<(), csv::Error>
    where
        W: io::Write,
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(ToString::to_string))?;
        }
        writer.flush()?;
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterates the values of one column, `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|values| &values[idx])
    }

    /// Applies `f` to every value of a column. Returns `false` if the column
    /// is absent.
    pub fn update_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&mut Value),
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            f(&mut row[idx]);
        }
        true
    }

    /// Applies `f` to every cell of every column.
    pub fn update_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Value),
    {
        for value in self.rows.iter_mut().flatten() {
            f(value);
        }
    }

    /// Mutable access to the cells of a row by index.
    pub fn row_mut(&mut self, row: usize) -> Option<&mut [Value]> {
        self.rows.get_mut(row).map(Vec::as_mut_slice)
    }

    /// Keeps the columns for which `keep` returns `true`; returns the names of
    /// the dropped ones.
    pub fn retain_columns<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(usize, &str) -> bool,
    {
        let mask = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| keep(idx, name))
            .collect::<Vec<_>>();
        if mask.iter().all(|keep| *keep) {
            return vec![];
        }

        let mut dropped = vec![];
        let mut columns = vec![];
        for (name, keep) in self.columns.drain(..).zip(&mask) {
            if *keep {
                columns.push(name);
            } else {
                dropped.push(name);
            }
        }
        self.columns = columns;

        for row in &mut self.rows {
            let mut keep = mask.iter();
            row.retain(|_| keep.next().copied().unwrap_or(true));
        }
        dropped
    }

    /// Keeps the rows for which `keep` returns `true`; returns the number of
    /// rows removed.
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| keep(row));
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordTable {
        let tsv = "case_id\tvital_status\tdays_to_death\n\
                   a\tDead\t120\n\
                   b\tAlive\t'--\n\
                   c\t\tNA\n";
        RecordTable::from_reader(tsv.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_parses_cells() {
        let table = sample();
        assert_eq!(table.columns(), ["case_id", "vital_status", "days_to_death"]);
        assert_eq!(table.get(0, "days_to_death"), Some(&Value::Text("120".to_owned())));
        assert_eq!(table.get(2, "vital_status"), Some(&Value::Missing));
        assert_eq!(table.get(2, "days_to_death"), Some(&Value::Missing));
        assert_eq!(table.get(1, "missing_column"), None);
    }

    #[test]
    fn test_numeric_looking_identifiers_keep_their_spelling() {
        let tsv = "case_id\tage\n007\t61\n1.50\t-4\n";
        let table = RecordTable::from_reader(tsv.as_bytes()).unwrap();
        assert_eq!(table.get(0, "case_id"), Some(&Value::Text("007".to_owned())));
        assert_eq!(table.get(1, "case_id"), Some(&Value::Text("1.50".to_owned())));

        let mut out = vec![];
        table.write_tsv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), tsv);
    }

    #[test]
    fn test_duplicate_columns_are_rejected() {
        let result = RecordTable::from_reader("a\tb\ta\n1\t2\t3\n".as_bytes());
        assert!(matches!(
            result,
            Err(LoadTableError::DuplicateColumn { column }) if column == "a"
        ));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let result = RecordTable::new(
            vec!["a".to_owned(), "b".to_owned()],
            vec![vec![Value::Missing]],
        );
        assert!(matches!(result, Err(LoadTableError::RowLength { row: 0, .. })));
    }

    #[test]
    fn test_coerce_numeric_reports_lost_values() {
        let mut text = Value::Text(" 12.5".to_owned());
        assert!(!text.coerce_numeric());
        assert_eq!(text, Value::Number(12.5));

        let mut junk = Value::Text("unknown".to_owned());
        assert!(junk.coerce_numeric());
        assert_eq!(junk, Value::Missing);

        let mut missing = Value::Missing;
        assert!(!missing.coerce_numeric());
    }

    #[test]
    fn test_retain_columns_keeps_rows_aligned() {
        let mut table = sample();
        let dropped = table.retain_columns(|_, name| name != "vital_status");
        assert_eq!(dropped, vec!["vital_status".to_owned()]);
        assert_eq!(table.columns(), ["case_id", "days_to_death"]);
        assert!(table.rows().iter().all(|row| row.len() == 2));
        assert_eq!(table.get(0, "days_to_death").and_then(Value::as_number), Some(120.0));
    }

    #[test]
    fn test_write_tsv_round_trips_missing_as_empty() {
        let table = sample();
        let mut out = vec![];
        table.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "case_id\tvital_status\tdays_to_death\na\tDead\t120\nb\tAlive\t'--\nc\t\t\n"
        );
    }
}
