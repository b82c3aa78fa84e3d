use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;
use log::info;
use simple_error::{SimpleResult, bail, try_with};

use super::{AssemblerCommand, AssemblerConfig, push_option};
use crate::classify::LibraryBuckets;
use crate::library::LibType;
use crate::params::AssemblyParams;
use crate::reads::ReadFiles;
use crate::resources::ResourceBudget;

pub const UNICYCLER_OUTPUT_FILENAME: &str = "assembly.fasta";

const COMBINED_FWD_FILENAME: &str = "short_fwd.fastq";
const COMBINED_REV_FILENAME: &str = "short_rev.fastq";
const COMBINED_UNPAIRED_FILENAME: &str = "short_unpaired.fastq";

/// Concatenate each source file into `dest`, removing each source once it is consumed
///
/// Any existing `dest` file is truncated first. Sources ending in `.gz` are decompressed while copying.
///
pub fn combine_reads(sources: &[&Utf8Path], dest: &Utf8Path) -> SimpleResult<()> {
    let f = try_with!(File::create(dest), "Unable to create combined reads file '{dest}'");
    let mut writer = BufWriter::new(f);

    for source in sources {
        info!("Appending reads from '{source}' to '{dest}'");
        let f = try_with!(File::open(source), "Unable to open reads file '{source}'");
        let copy_result = if source.as_str().to_lowercase().ends_with(".gz") {
            io::copy(&mut MultiGzDecoder::new(BufReader::new(f)), &mut writer)
        } else {
            io::copy(&mut BufReader::new(f), &mut writer)
        };
        try_with!(copy_result, "Unable to append reads file '{source}' to '{dest}'");
        try_with!(fs::remove_file(source), "Unable to remove consumed reads file '{source}'");
    }

    try_with!(writer.flush(), "Unable to write combined reads file '{dest}'");
    Ok(())
}

/// Unicycler run over combined read files
pub struct UnicyclerCommand<'a> {
    program: Utf8PathBuf,
    params: &'a AssemblyParams,
    output_dir: Utf8PathBuf,
    short_fwd: Utf8PathBuf,
    short_rev: Utf8PathBuf,
    short_unpaired: Option<Utf8PathBuf>,
    long_reads: Option<Utf8PathBuf>,
}

impl<'a> UnicyclerCommand<'a> {
    /// Combine classified libraries into the single files Unicycler accepts
    ///
    /// Paired libraries are merged into one forward and one reverse file, unpaired libraries into one file.
    /// Only a single long read library is supported.
    ///
    pub fn new(
        config: &AssemblerConfig,
        params: &'a AssemblyParams,
        buckets: &LibraryBuckets,
        combine_dir: &Utf8Path,
    ) -> SimpleResult<Self> {
        let mut fwd_files = Vec::new();
        let mut rev_files = Vec::new();
        for data in buckets.get(LibType::PairedEnd) {
            match &data.files {
                ReadFiles::Paired { fwd, rev } => {
                    fwd_files.push(fwd.as_path());
                    rev_files.push(rev.as_path());
                }
                ReadFiles::Single(_) => {
                    bail!(
                        "Unicycler requires separate forward and reverse files, but paired library '{}' is interleaved",
                        data.reads_ref
                    );
                }
            }
        }
        if fwd_files.is_empty() {
            bail!("Unicycler requires at least one short paired end reads library");
        }

        let short_fwd = combine_dir.join(COMBINED_FWD_FILENAME);
        let short_rev = combine_dir.join(COMBINED_REV_FILENAME);
        info!("Combining short paired end reads");
        combine_reads(&fwd_files, &short_fwd)?;
        combine_reads(&rev_files, &short_rev)?;

        let unpaired_files = buckets
            .get(LibType::Single)
            .iter()
            .flat_map(|x| x.files.paths())
            .collect::<Vec<_>>();
        let short_unpaired = if unpaired_files.is_empty() {
            None
        } else {
            let path = combine_dir.join(COMBINED_UNPAIRED_FILENAME);
            info!("Combining short unpaired reads");
            combine_reads(&unpaired_files, &path)?;
            Some(path)
        };

        let long_libraries = buckets
            .iter()
            .filter(|(x, _)| !matches!(x, LibType::PairedEnd | LibType::Single))
            .flat_map(|(_, x)| x.iter())
            .collect::<Vec<_>>();
        let long_reads = match long_libraries.as_slice() {
            [] => None,
            [x] => Some(x.files.fwd().to_owned()),
            _ => bail!("Unicycler accepts only one long reads library"),
        };

        Ok(Self {
            program: config.unicycler_bin.clone(),
            params,
            output_dir: config.assembler_output_dir(),
            short_fwd,
            short_rev,
            short_unpaired,
            long_reads,
        })
    }
}

impl AssemblerCommand for UnicyclerCommand<'_> {
    fn name(&self) -> &str {
        "unicycler"
    }

    fn program(&self) -> &Utf8Path {
        &self.program
    }

    fn args(&self, budget: &ResourceBudget) -> Vec<String> {
        let mut args = Vec::new();
        push_option(&mut args, "-1", &self.short_fwd);
        push_option(&mut args, "-2", &self.short_rev);
        if let Some(x) = &self.short_unpaired {
            push_option(&mut args, "-s", x);
        }
        if let Some(x) = &self.long_reads {
            push_option(&mut args, "-l", x);
        }
        push_option(&mut args, "-o", &self.output_dir);
        push_option(&mut args, "--threads", budget.threads);
        if self.params.min_contig_length > 0 {
            push_option(&mut args, "--min_fasta_length", self.params.min_contig_length);
        }
        push_option(&mut args, "--linear_seqs", self.params.unicycler.num_linear_seqs);
        push_option(&mut args, "--mode", self.params.unicycler.bridging_mode);
        args
    }

    fn output_filename(&self) -> &'static str {
        UNICYCLER_OUTPUT_FILENAME
    }
}
