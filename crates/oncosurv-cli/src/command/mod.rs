use clap::{Parser, Subcommand};

use self::{
    clean::CleanArg, demographics::DemographicsArg, feature_importance::FeatureImportanceArg,
    survival::SurvivalArg,
};

mod clean;
mod demographics;
mod feature_importance;
mod survival;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What to do with the clinical records
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Clean clinical records into an analysis-ready cohort
    Clean(#[clap(flatten)] CleanArg),
    /// Summarize age, gender, ethnicity and race of the cohort
    Demographics(#[clap(flatten)] DemographicsArg),
    /// Compare survival between tumor stages
    Survival(#[clap(flatten)] SurvivalArg),
    /// Rank and plot externally computed feature importances
    FeatureImportance(#[clap(flatten)] FeatureImportanceArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Clean(arg) => clean::run(&arg)?,
        Mode::Demographics(arg) => demographics::run(&arg)?,
        Mode::Survival(arg) => survival::run(&arg)?,
        Mode::FeatureImportance(arg) => feature_importance::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_min_group_size_flag_is_parsed() {
        let args = CommandArgs::try_parse_from([
            "oncosurv",
            "survival",
            "clinical.tsv",
            "--min-group-size",
            "30",
        ])
        .unwrap();
        let Mode::Survival(arg) = args.mode else {
            panic!("expected survival mode");
        };
        assert_eq!(arg.min_group_size, Some(30));
        assert!(arg.output_dir.is_none());
    }
}
