use camino::{Utf8Path, Utf8PathBuf};

use super::{AssemblerCommand, AssemblerConfig, push_flag, push_option};
use crate::params::AssemblyParams;
use crate::resources::ResourceBudget;

pub const SPADES_OUTPUT_FILENAME: &str = "scaffolds.fasta";

/// SPAdes run over a dataset manifest
pub struct SpadesCommand<'a> {
    program: Utf8PathBuf,
    params: &'a AssemblyParams,
    dataset_manifest: Utf8PathBuf,
    output_dir: Utf8PathBuf,
    tmp_dir: Utf8PathBuf,

    /// Set when any resolved library was sequenced on IonTorrent
    has_iontorrent_reads: bool,
}

impl<'a> SpadesCommand<'a> {
    pub fn new(
        config: &AssemblerConfig,
        params: &'a AssemblyParams,
        dataset_manifest: &Utf8Path,
        has_iontorrent_reads: bool,
    ) -> Self {
        Self {
            program: config.spades_bin.clone(),
            params,
            dataset_manifest: dataset_manifest.to_owned(),
            output_dir: config.assembler_output_dir(),
            tmp_dir: config.assembler_tmp_dir(),
            has_iontorrent_reads,
        }
    }
}

impl AssemblerCommand for SpadesCommand<'_> {
    fn name(&self) -> &str {
        "spades.py"
    }

    fn program(&self) -> &Utf8Path {
        &self.program
    }

    fn args(&self, budget: &ResourceBudget) -> Vec<String> {
        let mut args = Vec::new();
        push_option(&mut args, "--threads", budget.threads);
        push_option(&mut args, "--memory", budget.memory_gb);
        push_option(&mut args, "-o", &self.output_dir);
        push_option(&mut args, "--tmp-dir", &self.tmp_dir);
        push_option(&mut args, "--dataset", &self.dataset_manifest);
        if !self.params.kmer_sizes.is_empty() {
            push_option(&mut args, "-k", self.params.kmer_sizes_arg());
        }

        if let Some(flag) = self.params.dna_source.spades_flag() {
            push_flag(&mut args, flag);
        }
        if self.has_iontorrent_reads {
            push_flag(&mut args, "--iontorrent");
        }

        for option in self.params.pipeline_options.iter() {
            match option.spades_args() {
                [flag] => push_flag(&mut args, flag),
                [flag, value] => push_option(&mut args, flag, value),
                _ => {}
            }
        }
        args
    }

    fn output_filename(&self) -> &'static str {
        SPADES_OUTPUT_FILENAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{AssemblerKind, validate_params};
    use serde_json::json;

    fn test_config() -> AssemblerConfig {
        AssemblerConfig {
            spades_bin: Utf8PathBuf::from("/opt/spades/bin/spades.py"),
            unicycler_bin: Utf8PathBuf::from("unicycler"),
            run_dir: Utf8PathBuf::from("/run"),
        }
    }

    fn test_budget() -> ResourceBudget {
        ResourceBudget {
            threads: 12,
            memory_gb: 15,
            available_memory_bytes: 16_000_000_000,
        }
    }

    #[test]
    fn test_spades_args() {
        let raw = json!({
            "workspace_name": "ws",
            "output_contigset_name": "out",
            "reads_libraries": ["pe"],
            "dna_source": "single_cell",
            "kmer_sizes": [21, 33],
            "pipeline_options": ["careful", "cov-cutoff"],
        });
        let params = validate_params(&raw, AssemblerKind::Spades).unwrap();
        let manifest = Utf8PathBuf::from("/run/input_data_set.yaml");
        let command = SpadesCommand::new(&test_config(), &params, &manifest, false);
        assert_eq!(command.program().as_str(), "/opt/spades/bin/spades.py");
        assert_eq!(command.output_filename(), "scaffolds.fasta");

        let args = command.args(&test_budget());
        assert_eq!(
            args,
            vec![
                "--threads",
                "12",
                "--memory",
                "15",
                "-o",
                "/run/assembler_output",
                "--tmp-dir",
                "/run/assembler_tmp",
                "--dataset",
                "/run/input_data_set.yaml",
                "-k",
                "21,33",
                "--sc",
                "--careful",
                "--cov-cutoff",
                "auto",
            ]
        );
    }

    #[test]
    fn test_iontorrent_flag_once() {
        let raw = json!({
            "workspace_name": "ws",
            "output_contigset_name": "out",
            "reads_libraries": ["pe"],
            "dna_source": "iontorrent",
        });
        let params = validate_params(&raw, AssemblerKind::Spades).unwrap();
        let manifest = Utf8PathBuf::from("/run/input_data_set.yaml");
        let command = SpadesCommand::new(&test_config(), &params, &manifest, true);
        let args = command.args(&test_budget());
        assert_eq!(args.iter().filter(|x| *x == "--iontorrent").count(), 1);
    }

    #[test]
    fn test_metagenomic_args() {
        let raw = json!({
            "workspace_name": "ws",
            "output_contigset_name": "out",
            "reads_libraries": ["pe"],
            "dna_source": "metagenomic",
            "skip_error_correction": 1,
        });
        let params = validate_params(&raw, AssemblerKind::Spades).unwrap();
        let manifest = Utf8PathBuf::from("/run/input_data_set.yaml");
        let command = SpadesCommand::new(&test_config(), &params, &manifest, false);
        let args = command.args(&test_budget());
        assert!(args.contains(&"--meta".to_string()));
        assert!(args.contains(&"--only-assembler".to_string()));
        assert!(!args.contains(&"--careful".to_string()));
    }
}
