//! Tumor stage survival comparison command
//!
//! Builds the cohort, keeps the tumor stages with enough patients and
//! compares their survival with Kaplan-Meier statistics and pairwise
//! log-rank tests.

mod export;
mod table;

use std::{collections::BTreeMap, fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Args;
use oncosurv_analysis::{
    pairwise::{LogRank, PairResult},
    stage::{StageComparison, compare_stages},
};

use self::table::SurvivalTableRow;
use crate::{
    render::{
        self,
        heatmap::draw_pvalue_heatmap,
        km::{KmSeries, draw_km_plot},
    },
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct SurvivalArg {
    /// Path to the tab-separated clinical records file
    pub input: PathBuf,

    /// Path to the analysis config JSON file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory for plots, CSV files and the JSON summary
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Smallest stage group to compare (overrides the config file)
    #[arg(long)]
    pub min_group_size: Option<usize>,
}

pub(crate) fn run(arg: &SurvivalArg) -> anyhow::Result<()> {
    let mut config = util::read_config(arg.config.as_deref())?;
    if let Some(min_group_size) = arg.min_group_size {
        config.comparison.min_group_size = min_group_size;
    }

    let cohort = util::load_cohort(&arg.input, &config.cohort)?;
    let comparison = compare_stages(&cohort, &config.comparison, &LogRank)
        .context("Failed to compare tumor stages")?;

    println!("Survival Analysis Report (min group size={})", config.comparison.min_group_size);
    println!("==========================================\n");

    util::print_cohort_report(cohort.report(), cohort.len());
    println!();

    print_stage_groups(&comparison, config.comparison.min_group_size);
    println!();

    table::print_legend();
    println!();

    let rows = comparison
        .labels
        .iter()
        .filter_map(|label| {
            comparison
                .survival
                .map
                .get(label)
                .map(|stats| SurvivalTableRow { label: &**label, stats })
        })
        .collect::<Vec<_>>();
    println!("Survival by Tumor Stage ({} patients)", comparison.cohort.len());
    table::print_survival_table("Tumor Stage", &rows);
    println!();

    let pairs = tested_pairs(&comparison);
    table::print_pairwise_table(&pairs);
    println!();

    table::print_pvalue_matrix(&comparison.matrix);

    if let Some(dir) = &arg.output_dir {
        println!();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        let style = &config.plot;

        let horizons = follow_up_horizons(&comparison);
        let series = comparison
            .labels
            .iter()
            .filter_map(|label| {
                comparison.survival.map.get(label).map(|stats| KmSeries {
                    label: &**label,
                    curve: &stats.km_curve,
                    horizon: horizons.get(label).copied().unwrap_or(0.0),
                })
            })
            .collect::<Vec<_>>();
        render::save_svg(&dir.join("km_by_stage.svg"), style, |root| {
            draw_km_plot(root, style, &series, comparison.cohort.len())
        })?;
        export::save_km_curves(
            &dir.join("km_by_stage.csv"),
            &comparison.labels,
            &comparison.survival,
        )?;
        export::save_pairwise_results(&dir.join("logrank_pairwise.csv"), &pairs)?;
        render::save_svg(&dir.join("stage_pvalues.svg"), style, |root| {
            draw_pvalue_heatmap(
                root,
                style,
                &comparison.matrix,
                config.comparison.significance_threshold,
            )
        })?;

        let summary = export::build_summary(
            &arg.input,
            cohort.len(),
            &comparison,
            &pairs,
            config.comparison.min_group_size,
            config.comparison.significance_threshold,
        );
        let summary_path = dir.join("summary.json");
        Output::open(summary_path.clone())?.write_json(&summary)?;
        println!("  Summary saved to: {}", summary_path.display());
    }

    Ok(())
}

fn print_stage_groups(comparison: &StageComparison, min_group_size: usize) {
    println!("Tumor Stage Groups");
    println!("  {:<20} {:>8}  Status", "Tumor Stage", "Patients");
    println!("  {}", "-".repeat(40));
    for (label, count) in &comparison.stage_counts {
        let status = if comparison.labels.contains(label) {
            "compared"
        } else {
            "excluded"
        };
        println!("  {label:<20} {count:>8}  {status}");
    }
    println!("  (Stages with fewer than {min_group_size} patients are excluded)");
}

/// Tested pairs in matrix order, more severe stage first.
fn tested_pairs(comparison: &StageComparison) -> Vec<(&str, &str, PairResult)> {
    let labels = &comparison.labels;
    (0..labels.len())
        .flat_map(|i| (0..i).map(move |j| (i, j)))
        .filter_map(|(i, j)| {
            comparison
                .results
                .get(&labels[i], &labels[j])
                .map(|result| (&*labels[i], &*labels[j], *result))
        })
        .collect()
}

/// Longest recorded time of each compared stage.
fn follow_up_horizons(comparison: &StageComparison) -> BTreeMap<Arc<str>, f64> {
    let mut horizons = BTreeMap::<Arc<str>, f64>::new();
    for patient in comparison.cohort.patients() {
        if let Some(stage) = &patient.tumor_stage {
            let horizon = horizons.entry(Arc::clone(stage)).or_insert(0.0);
            *horizon = horizon.max(patient.days_to_death);
        }
    }
    horizons
}
