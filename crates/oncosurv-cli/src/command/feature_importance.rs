use std::path::PathBuf;

use clap::Args;
use oncosurv_analysis::importance::{FeatureImportances, SIGNIFICANCE_THRESHOLD};

use crate::{
    render::{self, importance::draw_feature_importances, style::PlotStyle},
    util,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct FeatureImportanceArg {
    /// Path to the feature importance JSON file
    pub file: PathBuf,

    /// Path of the bar chart SVG
    #[arg(long, default_value = "feature_importance.svg")]
    pub output: PathBuf,

    /// Importance below which a feature is marked uninformative
    #[arg(long, default_value_t = SIGNIFICANCE_THRESHOLD)]
    pub threshold: f64,
}

pub(crate) fn run(arg: &FeatureImportanceArg) -> anyhow::Result<()> {
    let importances: FeatureImportances = util::read_json_file("feature importance", &arg.file)?;
    let ranked = importances.ranked()?;

    println!("{}", importances.title());
    println!("  {:<4} {:<30} {:>12}", "Rank", "Feature", "Importance");
    println!("  {}", "-".repeat(48));
    for (rank, (feature, importance)) in ranked.iter().enumerate() {
        let marker = if *importance < arg.threshold { " (below threshold)" } else { "" };
        println!("  {:<4} {feature:<30} {importance:>12.6}{marker}", rank + 1);
    }
    println!();

    let style = PlotStyle::default();
    render::save_svg(&arg.output, &style, |root| {
        draw_feature_importances(root, &style, &importances.title(), &ranked, arg.threshold)
    })?;
    Ok(())
}
