//! Survival report tables
//!
//! Fixed-width tables printed to stdout by the `survival` command.

use oncosurv_analysis::{pairwise::PairResult, stage::PairwiseMatrix, survival::SurvivalStats};

/// A row in a survival statistics table
pub(super) struct SurvivalTableRow<'a> {
    /// Stage label
    pub label: &'a str,
    pub stats: &'a SurvivalStats,
}

fn print_survival_table_header(label_col: &str) {
    println!(
        "  {:<20} {:>8} {:>10} {:>12} {:>12} {:>12}",
        label_col, "Patients", "Censored%", "Mean(Comp)", "Mean(All)", "Median(KM)",
    );
}

fn print_survival_table_separator() {
    // label(20) + patients(8) + censored%(10) + 3 * mean/median(12) + spaces(5)
    println!("  {}", "-".repeat(79));
}

fn print_survival_table_row(row: &SurvivalTableRow<'_>) {
    let stats = row.stats;
    let median_str = stats
        .median_km
        .map_or("N/A".to_string(), |m| format!("{m:.1}"));

    println!(
        "  {:<20} {:>8} {:>9.1}% {:>12.1} {:>12.1} {:>12}",
        row.label,
        stats.count,
        stats.censoring_rate(),
        stats.mean_complete,
        stats.mean_all,
        median_str,
    );
}

/// Print a formatted survival statistics table
pub(super) fn print_survival_table(label_col: &str, rows: &[SurvivalTableRow<'_>]) {
    print_survival_table_header(label_col);
    print_survival_table_separator();

    for row in rows {
        print_survival_table_row(row);
    }
}

/// Print legend explaining table columns
pub(super) fn print_legend() {
    println!("Legend:");
    println!("  Censored%   : Patients alive at last follow-up");
    println!("  Mean(Comp)  : Mean time to death of deceased patients only");
    println!("  Mean(All)   : Naive mean of all times (deaths + follow-up, biased estimate)");
    println!("  Median(KM)  : Kaplan-Meier median survival (N/A when survival stays above 50%)");
}

/// Print one line per tested stage pair
pub(super) fn print_pairwise_table(pairs: &[(&str, &str, PairResult)]) {
    println!("Pairwise Log-rank test results:");
    println!(
        "  {:<20} {:<20} {:>14} {:>12} {:>10}",
        "Stage A", "Stage B", "test_statistic", "p", "-log2(p)"
    );
    println!("  {}", "-".repeat(80));
    for (a, b, result) in pairs {
        println!(
            "  {a:<20} {b:<20} {:>14.4} {:>12.4e} {:>10.2}",
            result.test_statistic,
            result.p_value,
            result.neg_log2_p(),
        );
    }
}

/// Print the lower triangle of the p-value matrix
pub(super) fn print_pvalue_matrix(matrix: &PairwiseMatrix) {
    let labels = matrix.labels();
    println!("p-value matrix:");
    print!("  {:<12}", "");
    for label in labels {
        print!(" {label:>12}");
    }
    println!();
    for (i, row_label) in labels.iter().enumerate() {
        print!("  {row_label:<12}");
        for j in 0..labels.len() {
            let p = matrix.get(i, j);
            if p.is_nan() {
                print!(" {:>12}", "");
            } else {
                print!(" {p:>12.4}");
            }
        }
        println!();
    }
}
