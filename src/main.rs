mod input;
mod logging;
mod model;
mod pipeline;
mod report;
mod store;

use std::path::PathBuf;

use clap::Parser;
use clap::builder::PossibleValuesParser;
use tracing::info;

use crate::input::{DATASET_VERSIONS, DEFAULT_DATA_ROOT, DatasetPaths};
use crate::model::thresholds::FilterConfig;
use crate::pipeline::{PipelineError, RunOptions, run_filter, run_ingest, run_stats, run_verify};

const DEFAULT_VERSION: &str = "20190828";

/// Ingest, filter and CPM-normalize a plate-based scRNA-seq dataset.
#[derive(Debug, Parser)]
#[command(name = "kira-scingest", disable_version_flag = true)]
struct Cli {
    /// Block to run: 1 ingest, 2 filter and normalize, 3 verify, 4 statistics.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    block: u8,

    /// Skip writing final outputs.
    #[arg(long)]
    dry: bool,

    /// Recompute keep-sets even if they already exist.
    #[arg(long)]
    force: bool,

    #[arg(long, default_value = DEFAULT_DATA_ROOT)]
    data_root: PathBuf,

    /// Dataset version; selects `<data-root>/all_<version>`.
    #[arg(long = "version", default_value = DEFAULT_VERSION, value_parser = PossibleValuesParser::new(DATASET_VERSIONS))]
    dataset_version: String,
}

impl Cli {
    fn options(&self) -> RunOptions {
        RunOptions {
            dry: self.dry,
            force: self.force,
        }
    }
}

fn main() {
    logging::init();
    if let Err(err) = run(Cli::parse()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let config = FilterConfig::default_v1();
    config.validate().map_err(PipelineError::Config)?;
    let paths = DatasetPaths::new(&cli.data_root, &cli.dataset_version);
    info!(
        block = cli.block,
        dir = %paths.dir.display(),
        dry = cli.dry,
        force = cli.force,
        "kira-scingest"
    );

    let opts = cli.options();
    match cli.block {
        1 => {
            run_ingest(&paths, &config, opts)?;
        }
        2 => {
            let report = run_filter(&paths, &config, opts)?;
            info!(
                cells = report.n_good_cells,
                genes = report.n_good_genes,
                kept_after_dedup = report.dedup.kept,
                "filtering done"
            );
        }
        3 => {
            run_verify(&paths, &config)?;
        }
        4 => {
            run_stats(&paths, &config, opts)?;
        }
        other => {
            return Err(PipelineError::Config(format!("unknown block {other}")));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
