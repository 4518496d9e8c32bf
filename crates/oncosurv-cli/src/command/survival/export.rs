//! Files written by the `survival` command

use std::{path::Path, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use oncosurv_analysis::{pairwise::PairResult, stage::StageComparison, survival::SurvivalStatsMap};
use serde::Serialize;

use crate::schema::summary::{CohortSummary, PairSummary, StageSummary, SurvivalSummary};

#[derive(Debug, Serialize)]
struct KmRow<'a> {
    stage: &'a str,
    time: f64,
    survival_prob: f64,
    lower_bound: f64,
    upper_bound: f64,
    at_risk: usize,
    events: usize,
}

#[derive(Debug, Serialize)]
struct PairRow<'a> {
    stage_a: &'a str,
    stage_b: &'a str,
    test_statistic: f64,
    p_value: f64,
    neg_log2_p: f64,
}

/// Save KM curves of every retained stage to one CSV file
pub(super) fn save_km_curves(
    path: &Path,
    labels: &[Arc<str>],
    all_stats: &SurvivalStatsMap<Arc<str>>,
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    for label in labels {
        let Some(stats) = all_stats.map.get(label) else {
            continue;
        };
        let km = &stats.km_curve;
        for i in 0..km.times.len() {
            let row = KmRow {
                stage: label,
                time: km.times[i],
                survival_prob: km.survival_prob[i],
                lower_bound: km.lower_bound[i],
                upper_bound: km.upper_bound[i],
                at_risk: km.at_risk[i],
                events: km.events[i],
            };
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write CSV data for stage {label}"))?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    println!("  KM curves saved to: {}", path.display());

    Ok(())
}

/// Save the pairwise test results to a CSV file
pub(super) fn save_pairwise_results(
    path: &Path,
    pairs: &[(&str, &str, PairResult)],
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    for (a, b, result) in pairs {
        let row = PairRow {
            stage_a: a,
            stage_b: b,
            test_statistic: result.test_statistic,
            p_value: result.p_value,
            neg_log2_p: result.neg_log2_p(),
        };
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write CSV data for {a} vs {b}"))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    println!("  Log-rank results saved to: {}", path.display());

    Ok(())
}

/// Collect the run's results into the `summary.json` record
///
/// `cohort_rows` is the size of the built cohort before small stages are
/// removed; `patients` counts the compared patients only.
pub(super) fn build_summary(
    input: &Path,
    cohort_rows: usize,
    comparison: &StageComparison,
    pairs: &[(&str, &str, PairResult)],
    min_group_size: usize,
    significance_threshold: f64,
) -> SurvivalSummary {
    let stages = comparison
        .labels
        .iter()
        .filter_map(|label| {
            comparison.survival.map.get(label).map(|stats| StageSummary {
                label: label.to_string(),
                patients: stats.count,
                censored: stats.censored_count,
                median_km: stats.median_km,
            })
        })
        .collect();

    let pairs = pairs
        .iter()
        .map(|(a, b, result)| PairSummary {
            stage_a: (*a).to_owned(),
            stage_b: (*b).to_owned(),
            test_statistic: result.test_statistic,
            p_value: result.p_value,
            neg_log2_p: result.neg_log2_p(),
            significant: result.p_value < significance_threshold,
        })
        .collect();

    SurvivalSummary {
        generated_at: Utc::now(),
        input: input.display().to_string(),
        min_group_size,
        significance_threshold,
        patients: comparison.cohort.len(),
        stages,
        pairs,
        cohort: CohortSummary::new(comparison.cohort.report(), cohort_rows),
    }
}

#[cfg(test)]
mod tests {
    use std::{fmt::Write as _, fs, path::PathBuf};

    use oncosurv_analysis::{
        cohort::{CohortConfig, build_cohort},
        pairwise::LogRank,
        stage::{ComparisonConfig, compare_stages},
        table::RecordTable,
    };

    use super::*;

    /// Returns the cohort size before small stages are removed, and the comparison
    fn comparison() -> (usize, StageComparison) {
        let mut tsv = String::from(
            "case_id\tvital_status\ttumor_stage\tdays_to_death\tdays_to_last_follow_up\n",
        );
        for i in 0..12 {
            let _ = writeln!(tsv, "a{i}\tDead\tstage i\t{}\t'--", 400 + i * 30);
            let _ = writeln!(tsv, "b{i}\tAlive\tstage iia\t'--\t{}", 600 + i * 10);
            let _ = writeln!(tsv, "c{i}\tDead\tstage iv\t{}\t'--", 40 + i * 10);
        }
        for i in 0..3 {
            let _ = writeln!(tsv, "d{i}\tDead\tstage iii\t{}\t'--", 200 + i * 10);
        }
        let table = RecordTable::from_reader(tsv.as_bytes()).unwrap();
        let cohort = build_cohort(&table, &CohortConfig::default()).unwrap();
        let config = ComparisonConfig {
            min_group_size: 10,
            ..ComparisonConfig::default()
        };
        let comparison = compare_stages(&cohort, &config, &LogRank).unwrap();
        (cohort.len(), comparison)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("oncosurv-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_summary_follows_stage_order() {
        let (cohort_rows, comparison) = comparison();
        let pairs = [
            ("stage iv", "stage i", PairResult { test_statistic: 20.0, p_value: 1e-5 }),
            ("stage iv", "stage iia", PairResult { test_statistic: 0.5, p_value: 0.48 }),
        ];
        let summary = build_summary(
            Path::new("clinical.tsv"),
            cohort_rows,
            &comparison,
            &pairs,
            10,
            0.05,
        );

        let labels = summary.stages.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, ["stage i", "stage iia", "stage iv"]);
        assert_eq!(summary.patients, 36);
        assert_eq!(summary.stages[1].censored, 12);
        assert!(summary.stages[1].median_km.is_none());
        assert!(summary.pairs[0].significant);
        assert!(!summary.pairs[1].significant);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["patients"], 36);
        assert_eq!(json["cohort"]["cohort_rows"], 39);
    }

    #[test]
    fn test_pairwise_csv_quotes_labels_with_commas() {
        let path = temp_path("pairwise.csv");
        let pairs = [(
            "stage ii, nos",
            "stage i",
            PairResult { test_statistic: 4.0, p_value: 0.25 },
        )];
        save_pairwise_results(&path, &pairs).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let records = reader.records().collect::<Result<Vec<_>, _>>().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["stage_a", "stage_b", "test_statistic", "p_value", "neg_log2_p"]
        );
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][0], "stage ii, nos");
        assert_eq!(&records[0][1], "stage i");
        assert_eq!(records[0][3].parse::<f64>().unwrap(), 0.25);
        assert_eq!(records[0][4].parse::<f64>().unwrap(), 2.0);
    }

    #[test]
    fn test_km_csv_keeps_one_row_per_step() {
        let (_, comparison) = comparison();
        let path = temp_path("km.csv");
        let labels = [Arc::<str>::from("stage i"), Arc::<str>::from("stage ii, nos")];
        save_km_curves(&path, &labels, &comparison.survival).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records = reader.records().collect::<Result<Vec<_>, _>>().unwrap();
        fs::remove_file(&path).unwrap();

        let km = &comparison.survival.map[&labels[0]].km_curve;
        assert_eq!(records.len(), km.times.len());
        assert!(records.iter().all(|r| &r[0] == "stage i" && r.len() == 7));
    }
}
