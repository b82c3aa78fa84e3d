mod assemble;
mod shared;
mod utils;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use simple_error::{SimpleResult, bail};

use self::assemble::{
    validate_and_fix_estimate_settings, validate_and_fix_spades_settings,
    validate_and_fix_unicycler_settings,
};
pub use self::assemble::{
    AssemblyInputSettings, EstimateSettings, SpadesSettings, UnicyclerSettings,
    write_assembly_settings,
};
pub use self::shared::SharedSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble short, long and contig read libraries with SPAdes
    Spades(SpadesSettings),

    /// Assemble a hybrid of short paired-end reads and long reads with Unicycler
    Unicycler(UnicyclerSettings),

    /// Estimate the cpu, memory and walltime requirements of a metaSPAdes run
    Estimate(EstimateSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    /// Output directory of the selected command, if it writes one
    pub fn get_output_dir(&self) -> Option<&Utf8Path> {
        match &self.command {
            Commands::Spades(x) => Some(x.output_dir.as_path()),
            Commands::Unicycler(x) => Some(x.output_dir.as_path()),
            Commands::Estimate(_) => None,
        }
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{label} already exists: \"{dirname}\"");
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
/// Assumes no logger has been configured yet
///
pub fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.command = match settings.command {
        Commands::Spades(x) => {
            let x = validate_and_fix_spades_settings(x)?;
            Commands::Spades(x)
        }
        Commands::Unicycler(x) => {
            let x = validate_and_fix_unicycler_settings(x)?;
            Commands::Unicycler(x)
        }
        Commands::Estimate(x) => {
            let x = validate_and_fix_estimate_settings(x)?;
            Commands::Estimate(x)
        }
    };

    if !settings.shared.clobber {
        if let Some(output_dir) = settings.get_output_dir() {
            check_novel_dirname(output_dir, "Output directory")?;
        }
    }

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}
