//! Resolved read libraries
//!
//! A [`ReadsResolver`] turns each declared library reference into local read files plus the quality metadata
//! needed for the pre-assembly consistency checks.
//!

use std::collections::{BTreeMap, HashSet};
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail, map_err_with, try_with};
use tempfile::TempDir;

use crate::filenames::READS_STAGING_PREFIX;
use crate::library::{LibType, Orientation, ReadLibraryRef};
use crate::params::{AssemblerKind, AssemblyParams, DnaSource};

pub const READS_FILE_EXTENSIONS: [&str; 4] = [".fq", ".fastq", ".fq.gz", ".fastq.gz"];
pub const CONTIGS_FILE_EXTENSIONS: [&str; 6] =
    [".fa", ".fasta", ".fna", ".fa.gz", ".fasta.gz", ".fna.gz"];

const SEQ_TECH_IONTORRENT: &str = "IonTorrent";
const SEQ_TECH_ILLUMINA: &str = "Illumina";

/// Local read files for one library
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ReadFiles {
    Paired { fwd: Utf8PathBuf, rev: Utf8PathBuf },

    /// Unpaired reads, or paired reads interleaved into one file
    Single(Utf8PathBuf),
}

impl ReadFiles {
    pub fn fwd(&self) -> &Utf8Path {
        match self {
            Self::Paired { fwd, .. } => fwd.as_path(),
            Self::Single(x) => x.as_path(),
        }
    }

    pub fn rev(&self) -> Option<&Utf8Path> {
        match self {
            Self::Paired { rev, .. } => Some(rev.as_path()),
            Self::Single(_) => None,
        }
    }

    pub fn paths(&self) -> Vec<&Utf8Path> {
        match self {
            Self::Paired { fwd, rev } => vec![fwd.as_path(), rev.as_path()],
            Self::Single(x) => vec![x.as_path()],
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, strum::Display)]
pub enum PhredType {
    #[serde(rename = "33")]
    #[strum(to_string = "33")]
    Phred33,

    #[serde(rename = "64")]
    #[strum(to_string = "64")]
    Phred64,
}

/// Quality metadata reported by the resolver for one library
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReadsMetadata {
    pub phred_type: Option<PhredType>,

    /// None when the library does not declare whether it comes from a single genome
    pub single_genome: Option<bool>,

    pub read_orientation_outward: bool,
    pub read_count: Option<u64>,
    pub read_length_mean: Option<f64>,
}

/// One library localized for this run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedReadsData {
    /// Reference in `workspace/name` form
    pub reads_ref: String,

    pub reads_name: String,
    pub files: ReadFiles,

    /// Sequencing technology label, such as "Illumina" or "PacBio CLR"
    pub seq_tech: String,

    pub lib_type: LibType,
    pub orientation: Option<Orientation>,
    pub metadata: ReadsMetadata,
}

impl ResolvedReadsData {
    pub fn is_iontorrent(&self) -> bool {
        self.seq_tech.eq_ignore_ascii_case(SEQ_TECH_IONTORRENT)
    }

    pub fn is_illumina(&self) -> bool {
        self.seq_tech.eq_ignore_ascii_case(SEQ_TECH_ILLUMINA)
    }
}

/// Name component of a `workspace/name` reference
pub fn reads_name_from_ref(reads_ref: &str) -> &str {
    match reads_ref.split_once('/') {
        Some((_, name)) => name,
        None => reads_ref,
    }
}

/// Source of local read files for declared libraries
pub trait ReadsResolver {
    fn resolve(&mut self, library: &ReadLibraryRef) -> SimpleResult<ResolvedReadsData>;
}

/// Resolve each distinct library reference once, in declaration order
pub fn resolve_libraries<'a>(
    resolver: &mut dyn ReadsResolver,
    libraries: impl IntoIterator<Item = &'a ReadLibraryRef>,
) -> SimpleResult<Vec<ResolvedReadsData>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    for library in libraries {
        if !seen.insert(library.lib_ref.clone()) {
            debug!("Skipping repeated reads library reference '{}'", library.lib_ref);
            continue;
        }
        info!("Resolving reads library '{}'", library.lib_ref);
        resolved.push(resolver.resolve(library)?);
    }
    Ok(resolved)
}

/// Check that a staged file name carries an extension the assemblers accept for this library type
pub fn check_file_extension(path: &Utf8Path, lib_type: LibType) -> SimpleResult<()> {
    let allowed: &[&str] = if lib_type.is_contigs() {
        &CONTIGS_FILE_EXTENSIONS
    } else {
        &READS_FILE_EXTENSIONS
    };
    let lower_name = path.as_str().to_lowercase();
    if !allowed.iter().any(|x| lower_name.ends_with(x)) {
        bail!(
            "File '{path}' for library type '{lib_type}' does not have a supported extension, expected one of: {}",
            allowed.join(", ")
        );
    }
    Ok(())
}

/// Pre-assembly SPAdes checks across the full set of resolved libraries
///
/// Only SPAdes runs are checked, Unicycler runs always pass.
///
pub fn check_library_consistency(
    params: &AssemblyParams,
    resolved: &[ResolvedReadsData],
) -> SimpleResult<()> {
    if params.assembler != AssemblerKind::Spades {
        return Ok(());
    }

    let has_iontorrent = resolved.iter().any(|x| x.is_iontorrent());
    let has_illumina = resolved.iter().any(|x| x.is_illumina());
    if has_iontorrent && has_illumina {
        bail!(
            "Both IonTorrent and Illumina read libraries exist. SPAdes can not assemble them together."
        );
    }

    let phred_group = |phred_type: PhredType| {
        resolved
            .iter()
            .filter(|x| x.metadata.phred_type == Some(phred_type))
            .map(|x| x.reads_ref.as_str())
            .join(", ")
    };
    let phred33 = phred_group(PhredType::Phred33);
    let phred64 = phred_group(PhredType::Phred64);
    if !phred33.is_empty() && !phred64.is_empty() {
        bail!(
            "The set of Reads objects passed in have reads that have different phred type scores. \
            SPAdes does not support assemblies of reads with different phred type scores.\n\
            The following read objects have phred 33 scores : {phred33}.\n\
            The following read objects have phred 64 scores : {phred64}"
        );
    }

    let is_metagenomic = params.dna_source == DnaSource::Metagenomic;
    for x in resolved.iter() {
        if x.metadata.read_orientation_outward {
            bail!(
                "Reads object {} ({}) is marked as having outward oriented reads, which SPAdes does not support.",
                x.reads_name,
                x.reads_ref
            );
        }
        match x.metadata.single_genome {
            Some(true) if is_metagenomic => {
                bail!(
                    "Reads object {} ({}) is marked as containing dna from a single genome but the assembly \
                    method was specified as metagenomic",
                    x.reads_name,
                    x.reads_ref
                );
            }
            Some(false) if !is_metagenomic => {
                bail!(
                    "Reads object {} ({}) is marked as containing metagenomic data but the assembly method \
                    was not specified as metagenomic",
                    x.reads_name,
                    x.reads_ref
                );
            }
            _ => {}
        }
    }

    let has_clr = resolved.iter().any(|x| x.lib_type == LibType::PacbioClr);
    let has_short_reads = resolved
        .iter()
        .any(|x| matches!(x.lib_type, LibType::PairedEnd | LibType::Single));
    if has_clr && !has_short_reads {
        bail!(
            "Per SPAdes requirements : If doing PacBio CLR reads, you must also supply at least one paired end \
            or single end reads library"
        );
    }

    Ok(())
}

fn default_seq_tech() -> String {
    SEQ_TECH_ILLUMINA.to_string()
}

/// One entry of the staged reads manifest
#[derive(Clone, Debug, Deserialize)]
pub struct StagedReadsEntry {
    pub fwd: Utf8PathBuf,
    pub rev: Option<Utf8PathBuf>,

    #[serde(default = "default_seq_tech")]
    pub sequencing_tech: String,

    pub phred_type: Option<PhredType>,
    pub single_genome: Option<bool>,

    #[serde(default)]
    pub read_orientation_outward: bool,

    pub read_count: Option<u64>,
    pub read_length_mean: Option<f64>,
}

/// Load the staged reads manifest from a JSON file, keyed on `workspace/name` references
pub fn load_staged_reads_manifest(
    manifest: &Utf8Path,
) -> SimpleResult<BTreeMap<String, StagedReadsEntry>> {
    let content = try_with!(
        fs::read_to_string(manifest),
        "Unable to read staged reads manifest '{manifest}'"
    );
    let entries = try_with!(
        serde_json::from_str(&content),
        "Unable to parse staged reads manifest '{manifest}'"
    );
    Ok(entries)
}

/// Resolver over read files already present on the local filesystem
///
/// Libraries are described by a JSON manifest keyed on `workspace/name` references. Each resolved file is
/// copied into a run-scoped staging directory, which is removed when the resolver is dropped.
///
pub struct StagedReadsResolver {
    entries: BTreeMap<String, StagedReadsEntry>,
    staging_dir: TempDir,
    staged_file_count: usize,
}

impl StagedReadsResolver {
    pub fn new(
        entries: BTreeMap<String, StagedReadsEntry>,
        staging_parent_dir: &Utf8Path,
    ) -> SimpleResult<Self> {
        let staging_dir = try_with!(
            tempfile::Builder::new()
                .prefix(READS_STAGING_PREFIX)
                .tempdir_in(staging_parent_dir),
            "Unable to create reads staging directory in '{staging_parent_dir}'"
        );
        Ok(Self {
            entries,
            staging_dir,
            staged_file_count: 0,
        })
    }

    pub fn from_manifest(manifest: &Utf8Path, staging_parent_dir: &Utf8Path) -> SimpleResult<Self> {
        Self::new(load_staged_reads_manifest(manifest)?, staging_parent_dir)
    }

    pub fn staging_dir(&self) -> &Utf8Path {
        Utf8Path::from_path(self.staging_dir.path()).unwrap_or(Utf8Path::new("."))
    }

    fn stage_file(&mut self, source: &Utf8Path, lib_type: LibType) -> SimpleResult<Utf8PathBuf> {
        check_file_extension(source, lib_type)?;
        let file_name = match source.file_name() {
            Some(x) => x,
            None => bail!("Reads file path '{source}' has no file name"),
        };
        self.staged_file_count += 1;
        let dest = self
            .staging_dir()
            .join(format!("{}_{}", self.staged_file_count, file_name));
        map_err_with!(
            fs::copy(source, &dest),
            "Unable to stage reads file '{source}' to '{dest}'"
        )?;
        Ok(dest)
    }
}

impl ReadsResolver for StagedReadsResolver {
    fn resolve(&mut self, library: &ReadLibraryRef) -> SimpleResult<ResolvedReadsData> {
        let entry = match self.entries.get(&library.lib_ref) {
            Some(x) => x.clone(),
            None => bail!(
                "Reads library '{}' is not present in the staged reads manifest",
                library.lib_ref
            ),
        };

        let fwd = self.stage_file(&entry.fwd, library.lib_type)?;
        let files = match &entry.rev {
            Some(rev) => {
                let rev = self.stage_file(rev, library.lib_type)?;
                ReadFiles::Paired { fwd, rev }
            }
            None => ReadFiles::Single(fwd),
        };

        Ok(ResolvedReadsData {
            reads_ref: library.lib_ref.clone(),
            reads_name: reads_name_from_ref(&library.lib_ref).to_string(),
            files,
            seq_tech: entry.sequencing_tech,
            lib_type: library.lib_type,
            orientation: library.orientation,
            metadata: ReadsMetadata {
                phred_type: entry.phred_type,
                single_genome: entry.single_genome,
                read_orientation_outward: entry.read_orientation_outward,
                read_count: entry.read_count,
                read_length_mean: entry.read_length_mean,
            },
        })
    }
}
