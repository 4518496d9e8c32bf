use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct CleanArg {
    /// Path to the tab-separated clinical records file
    pub input: PathBuf,

    /// Path to the analysis config JSON file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where to write the cleaned cohort (stdout by default)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &CleanArg) -> anyhow::Result<()> {
    let config = util::read_config(arg.config.as_deref())?;
    let cohort = util::load_cohort(&arg.input, &config.cohort)?;

    let mut output = Output::from_output_path(arg.output.clone())?;
    output.write_table(cohort.table())?;
    info!(
        patients = cohort.len(),
        output = %output.display_path(),
        "wrote cleaned cohort"
    );
    Ok(())
}
