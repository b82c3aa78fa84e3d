//! External assembler invocation
//!
//! Each supported assembler provides an [`AssemblerCommand`], which turns a resource budget into the full
//! command line. [`run_assembler`] launches the tool within a checked budget and waits for it.
//!

mod spades;
mod unicycler;

pub use spades::{SPADES_OUTPUT_FILENAME, SpadesCommand};
pub use unicycler::{UNICYCLER_OUTPUT_FILENAME, UnicyclerCommand, combine_reads};

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use log::info;
use simple_error::{SimpleResult, bail, try_with};

use crate::filenames::{ASSEMBLER_OUTPUT_DIRNAME, ASSEMBLER_TMP_DIRNAME};
use crate::os_utils::create_dir_all;
use crate::resources::ResourceBudget;

/// Tool locations and working paths shared by all assembler commands
#[derive(Clone, Debug)]
pub struct AssemblerConfig {
    pub spades_bin: Utf8PathBuf,
    pub unicycler_bin: Utf8PathBuf,

    /// Top-level directory for this run
    pub run_dir: Utf8PathBuf,
}

impl AssemblerConfig {
    /// Directory the assembler writes its results into
    pub fn assembler_output_dir(&self) -> Utf8PathBuf {
        self.run_dir.join(ASSEMBLER_OUTPUT_DIRNAME)
    }

    pub fn assembler_tmp_dir(&self) -> Utf8PathBuf {
        self.run_dir.join(ASSEMBLER_TMP_DIRNAME)
    }

    /// Create the assembler output and scratch directories
    pub fn create_assembler_dirs(&self) -> SimpleResult<()> {
        create_dir_all(&self.assembler_output_dir(), "assembler output")?;
        create_dir_all(&self.assembler_tmp_dir(), "assembler scratch")?;
        Ok(())
    }
}

/// Command line builder for one external assembler
pub trait AssemblerCommand {
    /// Name used in log and error messages
    fn name(&self) -> &str;

    fn program(&self) -> &Utf8Path;

    fn args(&self, budget: &ResourceBudget) -> Vec<String>;

    /// Name of the primary contig file the assembler leaves in its output tree
    fn output_filename(&self) -> &'static str;
}

/// Append a flag unless it is already on the command line
pub(crate) fn push_flag(args: &mut Vec<String>, flag: &str) {
    if !args.iter().any(|x| x == flag) {
        args.push(flag.to_string());
    }
}

/// Append a flag with its value unless the flag is already on the command line
pub(crate) fn push_option(args: &mut Vec<String>, flag: &str, value: impl ToString) {
    if !args.iter().any(|x| x == flag) {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

/// Run the external assembler within an already checked resource budget, blocking until it exits
///
/// A non-zero exit status is returned as an error including the raw code.
///
pub fn run_assembler(
    budget: &ResourceBudget,
    command: &dyn AssemblerCommand,
    working_dir: &Utf8Path,
) -> SimpleResult<()> {
    let args = command.args(budget);

    info!(
        "Running {} command line: {} {}",
        command.name(),
        command.program(),
        args.iter().join(" ")
    );

    let status = try_with!(
        Command::new(command.program())
            .args(&args)
            .current_dir(working_dir)
            .status(),
        "Unable to launch {} from '{}'",
        command.name(),
        command.program()
    );

    info!("{} return code: {:?}", command.name(), status.code());
    if !status.success() {
        match status.code() {
            Some(code) => bail!("Error running {}, return code: {}", command.name(), code),
            None => bail!("Error running {}, terminated by signal", command.name()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::GB;

    struct ShellCommand {
        program: Utf8PathBuf,
        script: String,
    }

    impl AssemblerCommand for ShellCommand {
        fn name(&self) -> &str {
            "test shell"
        }

        fn program(&self) -> &Utf8Path {
            &self.program
        }

        fn args(&self, budget: &ResourceBudget) -> Vec<String> {
            vec![
                "-c".to_string(),
                format!("{} {}", self.script, budget.threads),
            ]
        }

        fn output_filename(&self) -> &'static str {
            "out.fa"
        }
    }

    fn test_budget() -> ResourceBudget {
        ResourceBudget {
            threads: 6,
            memory_gb: 31,
            available_memory_bytes: 32 * GB,
        }
    }

    #[test]
    fn test_push_flag_once() {
        let mut args = Vec::new();
        push_flag(&mut args, "--careful");
        push_option(&mut args, "-k", "21,33");
        push_flag(&mut args, "--careful");
        push_option(&mut args, "-k", "55");
        assert_eq!(args, vec!["--careful", "-k", "21,33"]);
    }

    #[test]
    fn test_run_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let working_dir = Utf8Path::from_path(dir.path()).unwrap();
        let command = ShellCommand {
            program: Utf8PathBuf::from("sh"),
            script: "echo started > threads.txt; echo".to_string(),
        };
        run_assembler(&test_budget(), &command, working_dir).unwrap();
        assert!(working_dir.join("threads.txt").exists());
    }

    #[test]
    fn test_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let working_dir = Utf8Path::from_path(dir.path()).unwrap();
        let command = ShellCommand {
            program: Utf8PathBuf::from("sh"),
            script: "exit 3; echo".to_string(),
        };
        let err = run_assembler(&test_budget(), &command, working_dir).unwrap_err();
        assert_eq!(err.to_string(), "Error running test shell, return code: 3");
    }
}
