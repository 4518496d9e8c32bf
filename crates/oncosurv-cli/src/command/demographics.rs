use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Args;
use oncosurv_analysis::demographics::{CategoryCounts, DemographicSummary};

use crate::{
    render::{
        self,
        demographics::{draw_age_histogram, draw_category_counts},
    },
    util,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct DemographicsArg {
    /// Path to the tab-separated clinical records file
    pub input: PathBuf,

    /// Path to the analysis config JSON file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory for the distribution plots
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,
}

pub(crate) fn run(arg: &DemographicsArg) -> anyhow::Result<()> {
    let config = util::read_config(arg.config.as_deref())?;
    let cohort = util::load_cohort(&arg.input, &config.cohort)?;
    let summary = DemographicSummary::from_patients(cohort.patients());

    println!("Demographics Report ({})", arg.input.display());
    println!("==========================================\n");

    util::print_cohort_report(cohort.report(), cohort.len());
    println!();

    print_age(&summary);
    println!();
    print_categories("Gender", &summary.gender);
    println!();
    print_categories("Ethnicity", &summary.ethnicity);
    println!();
    print_categories("Race", &summary.race);

    if let Some(dir) = &arg.plot_dir {
        println!();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create plot directory: {}", dir.display()))?;
        let style = &config.plot;

        render::save_svg(&dir.join("age_histogram.svg"), style, |root| {
            draw_age_histogram(root, style, &summary.age.histogram, &summary.age.density)
        })?;
        let plots = [
            ("gender_counts.svg", "Gender Distribution", &summary.gender, false),
            ("ethnicity_counts.svg", "Ethnicity Distribution", &summary.ethnicity, false),
            ("race_counts.svg", "Race Distribution", &summary.race, true),
        ];
        for (file_name, title, counts, rotate_labels) in plots {
            render::save_svg(&dir.join(file_name), style, |root| {
                draw_category_counts(root, style, title, counts, rotate_labels)
            })?;
        }
    }

    Ok(())
}

fn print_age(summary: &DemographicSummary) {
    let age = &summary.age;
    println!("Age at Index");
    let Some(stats) = &age.stats else {
        println!("  No ages recorded ({} missing)", age.missing);
        return;
    };
    println!(
        "  {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Count", "Missing", "Mean", "Std", "Min", "P25", "P50", "P75", "Max"
    );
    println!("  {}", "-".repeat(80));
    let quartile = |p: f64| {
        age.quartiles
            .get(p)
            .map_or_else(|| "N/A".to_owned(), |v| format!("{v:.1}"))
    };
    println!(
        "  {:>8} {:>8} {:>8.1} {:>8.1} {:>8.1} {:>8} {:>8} {:>8} {:>8.1}",
        stats.count,
        age.missing,
        stats.mean,
        stats.std_dev,
        stats.min,
        quartile(25.0),
        quartile(50.0),
        quartile(75.0),
        stats.max,
    );
}

#[expect(clippy::cast_precision_loss)]
fn print_categories(name: &str, counts: &CategoryCounts) {
    let total = counts.total() + counts.missing;
    println!("{name}");
    println!("  {:<40} {:>8} {:>8}", "Value", "Count", "Share");
    println!("  {}", "-".repeat(58));
    let share = |count: usize| {
        if total == 0 {
            0.0
        } else {
            100.0 * count as f64 / total as f64
        }
    };
    for (label, count) in counts.by_count() {
        println!("  {label:<40} {count:>8} {:>7.1}%", share(count));
    }
    if counts.missing > 0 {
        println!(
            "  {:<40} {:>8} {:>7.1}%",
            "(missing)",
            counts.missing,
            share(counts.missing)
        );
    }
}
