use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use simple_error::SimpleResult;
use unwrap::unwrap;

use super::utils::{check_optional_filename, check_required_filename};
use crate::assembler::AssemblerConfig;
use crate::filenames::RUN_SETTINGS_FILENAME;

pub const DEFAULT_SPADES_BIN: &str = "spades.py";
pub const DEFAULT_UNICYCLER_BIN: &str = "unicycler";

/// Input files shared by all assembly commands
#[derive(Args, Default, Deserialize, Serialize)]
pub struct AssemblyInputSettings {
    /// Assembly parameters in JSON format
    ///
    /// This holds the workspace and output names, the reads library list, and all assembler options.
    ///
    #[arg(long = "params", value_name = "FILE")]
    pub params_filename: String,

    /// Staged reads manifest in JSON format
    ///
    /// Maps each `workspace/name` library reference to its local read files and reads metadata.
    ///
    #[arg(long = "reads", value_name = "FILE")]
    pub reads_filename: String,
}

impl AssemblyInputSettings {
    fn validate(&self) -> SimpleResult<()> {
        check_required_filename(&self.params_filename, "assembly parameters")?;
        check_required_filename(&self.reads_filename, "staged reads manifest")?;
        Ok(())
    }
}

#[derive(Args, Default, Deserialize, Serialize)]
pub struct SpadesSettings {
    /// Directory for all spades command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_spades_output"))]
    pub output_dir: Utf8PathBuf,

    #[command(flatten)]
    #[serde(flatten)]
    pub input: AssemblyInputSettings,

    /// Path to the SPAdes launcher script
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SPADES_BIN)]
    pub spades_bin: Utf8PathBuf,
}

impl SpadesSettings {
    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            spades_bin: self.spades_bin.clone(),
            unicycler_bin: Utf8PathBuf::from(DEFAULT_UNICYCLER_BIN),
            run_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Args, Default, Deserialize, Serialize)]
pub struct UnicyclerSettings {
    /// Directory for all unicycler command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_unicycler_output"))]
    pub output_dir: Utf8PathBuf,

    #[command(flatten)]
    #[serde(flatten)]
    pub input: AssemblyInputSettings,

    /// Path to the Unicycler executable
    #[arg(long, value_name = "PATH", default_value = DEFAULT_UNICYCLER_BIN)]
    pub unicycler_bin: Utf8PathBuf,
}

impl UnicyclerSettings {
    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            spades_bin: Utf8PathBuf::from(DEFAULT_SPADES_BIN),
            unicycler_bin: self.unicycler_bin.clone(),
            run_dir: self.output_dir.clone(),
        }
    }
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_spades_settings(settings: SpadesSettings) -> SimpleResult<SpadesSettings> {
    settings.input.validate()?;
    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_unicycler_settings(
    settings: UnicyclerSettings,
) -> SimpleResult<UnicyclerSettings> {
    settings.input.validate()?;
    Ok(settings)
}

#[derive(Args, Default, Deserialize, Serialize)]
pub struct EstimateSettings {
    /// metaSPAdes assembly parameters in JSON format
    #[arg(long = "params", value_name = "FILE")]
    pub params_filename: String,

    /// Staged reads manifest in JSON format, providing read count and length metadata per library
    #[arg(long = "reads", value_name = "FILE")]
    pub reads_filename: Option<String>,

    /// Check the inputs but report the fixed minimum estimate
    #[arg(long)]
    pub use_defaults: bool,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_estimate_settings(
    settings: EstimateSettings,
) -> SimpleResult<EstimateSettings> {
    check_required_filename(&settings.params_filename, "assembly parameters")?;
    check_optional_filename(settings.reads_filename.as_ref(), "staged reads manifest")?;
    Ok(settings)
}

/// Write assembly command settings out in json format
pub fn write_assembly_settings<T: Serialize>(output_dir: &Utf8Path, settings: &T) {
    use log::info;

    let filename = output_dir.join(RUN_SETTINGS_FILENAME);

    info!("Writing run settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create run settings json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &settings),
        "Unable to write run settings json file: '{filename}'"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_spades_settings() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        let params_filename = dir.join("params.json");
        fs::write(&params_filename, "{}").unwrap();

        let settings = SpadesSettings {
            output_dir: dir.join("out"),
            input: AssemblyInputSettings {
                params_filename: params_filename.to_string(),
                reads_filename: dir.join("missing.json").to_string(),
            },
            spades_bin: Utf8PathBuf::from(DEFAULT_SPADES_BIN),
        };
        let err = validate_and_fix_spades_settings(settings).err().unwrap();
        assert!(err.to_string().starts_with("Can't find specified staged reads manifest file"));

        let settings = SpadesSettings {
            output_dir: dir.join("out"),
            input: AssemblyInputSettings {
                params_filename: params_filename.to_string(),
                reads_filename: params_filename.to_string(),
            },
            spades_bin: Utf8PathBuf::from("/opt/spades.py"),
        };
        let settings = validate_and_fix_spades_settings(settings).ok().unwrap();
        let config = settings.assembler_config();
        assert_eq!(config.spades_bin, "/opt/spades.py");
        assert_eq!(config.run_dir, dir.join("out"));
    }

    #[test]
    fn test_write_assembly_settings() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        let settings = UnicyclerSettings {
            output_dir: dir.to_owned(),
            input: AssemblyInputSettings {
                params_filename: "params.json".to_string(),
                reads_filename: "reads.json".to_string(),
            },
            unicycler_bin: Utf8PathBuf::from(DEFAULT_UNICYCLER_BIN),
        };
        write_assembly_settings(dir, &settings);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(RUN_SETTINGS_FILENAME)).unwrap())
                .unwrap();
        assert_eq!(written["params_filename"], "params.json");
        assert_eq!(written["unicycler_bin"], "unicycler");
    }
}
