mod assembler;
mod classify;
mod cli;
mod contig_stats;
mod dataset;
mod estimate;
mod filenames;
mod globals;
mod library;
mod logger;
mod os_utils;
mod params;
mod publish;
mod reads;
mod report;
mod resources;
mod run_stats;
mod workflow;

use std::{error, process};

use hhmmss::Hhmmss;
use log::info;

use crate::cli::Commands;
use crate::estimate::run_estimate;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;
use crate::workflow::{run_spades, run_unicycler};

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let start = std::time::Instant::now();

    match &settings.command {
        Commands::Spades(x) => {
            run_spades(x)?;
        }
        Commands::Unicycler(x) => {
            run_unicycler(x)?;
        }
        Commands::Estimate(x) => {
            run_estimate(x)?;
        }
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the output directory for the log file:
    setup_output_dir_and_logger(settings.get_output_dir(), settings.shared.debug);

    if let Err(err) = run(&settings) {
        eprintln!("{err}");
        process::exit(2);
    }
}
