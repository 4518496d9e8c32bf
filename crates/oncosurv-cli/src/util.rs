use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use oncosurv_analysis::{
    cohort::{Cohort, CohortConfig, CohortReport, build_cohort},
    table::RecordTable,
};

use crate::schema::config::AnalysisConfig;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    /// Writes `table` as tab-separated text.
    pub fn write_table(&mut self, table: &RecordTable) -> anyhow::Result<()> {
        table
            .write_tsv(&mut *self)
            .with_context(|| format!("Failed to write table to {}", self.display_path()))?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {} JSON file: {}", file_kind, path.display()))?;

    Ok(value)
}

/// Read analysis settings, or the defaults when no file is given
pub fn read_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    match path {
        Some(path) => read_json_file("config", path),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Load a clinical records file and clean it into a cohort
///
/// # Errors
///
/// Returns error if the file cannot be read or lacks a required column
pub fn load_cohort(path: &Path, config: &CohortConfig) -> anyhow::Result<Cohort> {
    let table = RecordTable::load(path)
        .with_context(|| format!("Failed to load clinical records: {}", path.display()))?;
    let cohort = build_cohort(&table, config)
        .with_context(|| format!("Failed to build cohort from {}", path.display()))?;
    Ok(cohort)
}

/// Print what cleaning did to the input
pub fn print_cohort_report(report: &CohortReport, cohort_rows: usize) {
    println!("Cohort:");
    println!(
        "  Input: {} rows, {} columns",
        report.input_rows, report.input_columns
    );
    println!(
        "  Pruned sparse columns: {}",
        join_or_none(&report.pruned_columns)
    );
    println!(
        "  Dropped columns: {}",
        join_or_none(&report.dropped_columns)
    );
    println!(
        "  Missing markers normalized: {}, unparseable numbers: {}",
        report.normalized_values, report.unparseable_values
    );
    println!(
        "  Patches applied: {}, unmatched ids: {}",
        report.patches.applied,
        join_or_none(&report.patches.unmatched_ids)
    );
    println!(
        "  Follow-up backfilled: {}, rows excluded: {}",
        report.backfilled, report.excluded_rows
    );
    println!("  Patients: {cohort_rows}");
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_owned()
    } else {
        items.join(", ")
    }
}
