//! Assembly run parameters
//!
//! Raw caller parameters arrive as a JSON object. They are checked once here, in a fixed order, and converted
//! into the read-only [`AssemblyParams`] used by every later stage of the run.
//!

use std::str::FromStr;

use itertools::Itertools;
use log::{info, warn};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use simple_error::{SimpleResult, bail};

use crate::library::{LibType, Orientation, ReadLibraryRef, normalize_lib_ref};

pub const PARAM_WORKSPACE_NAME: &str = "workspace_name";
pub const PARAM_OUTPUT_NAME: &str = "output_contigset_name";
pub const PARAM_READS_LIBRARIES: &str = "reads_libraries";
pub const PARAM_LONG_READS_LIBRARIES: &str = "long_reads_libraries";
pub const PARAM_MIN_CONTIG_LENGTH: &str = "min_contig_length";
pub const PARAM_KMER_SIZES: &str = "kmer_sizes";
pub const PARAM_SKIP_ERROR_CORRECTION: &str = "skip_error_correction";
pub const PARAM_DNA_SOURCE: &str = "dna_source";
pub const PARAM_PIPELINE_OPTIONS: &str = "pipeline_options";
pub const PARAM_CREATE_REPORT: &str = "create_report";

pub const PARAM_SHORT_PAIRED_LIBRARIES: &str = "short_paired_libraries";
pub const PARAM_SHORT_UNPAIRED_LIBRARIES: &str = "short_unpaired_libraries";
pub const PARAM_LONG_READS_LIBRARY: &str = "long_reads_library";
pub const PARAM_NUM_LINEAR_SEQS: &str = "num_linear_seqs";
pub const PARAM_BRIDGING_MODE: &str = "bridging_mode";

pub const DEFAULT_KMER_SIZES: [i64; 3] = [21, 33, 55];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display)]
pub enum AssemblerKind {
    #[strum(to_string = "SPAdes")]
    Spades,

    #[strum(to_string = "Unicycler")]
    Unicycler,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, strum::Display, strum::EnumString)]
pub enum DnaSource {
    #[default]
    #[strum(to_string = "none", serialize = "None")]
    None,

    #[strum(to_string = "single_cell")]
    SingleCell,

    #[strum(to_string = "metagenomic", serialize = "metagenome")]
    Metagenomic,

    #[strum(to_string = "plasmid")]
    Plasmid,

    #[strum(to_string = "rna")]
    Rna,

    #[strum(to_string = "iontorrent")]
    IonTorrent,
}

impl DnaSource {
    /// Basic-option flag passed to SPAdes for this DNA source
    pub fn spades_flag(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::SingleCell => Some("--sc"),
            Self::Metagenomic => Some("--meta"),
            Self::Plasmid => Some("--plasmid"),
            Self::Rna => Some("--rna"),
            Self::IonTorrent => Some("--iontorrent"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum PipelineOption {
    Careful,
    OnlyErrorCorrection,
    OnlyAssembler,
    Continue,
    DisableGzipOutput,
    MismatchCorrection,
    CovCutoff,
}

impl PipelineOption {
    /// Command-line arguments for this option
    pub fn spades_args(&self) -> &'static [&'static str] {
        match self {
            Self::Careful => &["--careful"],
            Self::OnlyErrorCorrection => &["--only-error-correction"],
            Self::OnlyAssembler => &["--only-assembler"],
            Self::Continue => &["--continue"],
            Self::DisableGzipOutput => &["--disable-gzip-output"],
            Self::MismatchCorrection => &["--mismatch-correction"],
            Self::CovCutoff => &["--cov-cutoff", "auto"],
        }
    }

    /// Options the assembler refuses to combine with metagenomic mode
    fn is_metagenome_incompatible(&self) -> bool {
        matches!(
            self,
            Self::Careful | Self::MismatchCorrection | Self::CovCutoff
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BridgingMode {
    Conservative,
    #[default]
    Normal,
    Bold,
}

/// Options only used by the Unicycler command
#[derive(Clone, Debug, Default, Serialize)]
pub struct UnicyclerOptions {
    pub num_linear_seqs: u64,
    pub bridging_mode: BridgingMode,
}

/// Validated run configuration
#[derive(Clone, Debug, Serialize)]
pub struct AssemblyParams {
    pub assembler: AssemblerKind,
    pub workspace_name: String,
    pub output_name: String,

    /// Short read and contig libraries
    pub libraries: Vec<ReadLibraryRef>,

    /// Long read libraries, listed separately by the caller
    pub long_read_libraries: Vec<ReadLibraryRef>,

    pub dna_source: DnaSource,
    pub min_contig_length: u64,
    pub kmer_sizes: Vec<i64>,

    /// Ordered and de-duplicated
    pub pipeline_options: Vec<PipelineOption>,

    pub skip_error_correction: bool,
    pub create_report: bool,
    pub unicycler: UnicyclerOptions,
}

impl AssemblyParams {
    /// Kmer sizes in the comma-joined form expected on the assembler command line
    pub fn kmer_sizes_arg(&self) -> String {
        self.kmer_sizes.iter().join(",")
    }

    /// Reference of the assembly object produced by this run
    pub fn assembly_ref(&self) -> String {
        format!("{}/{}", self.workspace_name, self.output_name)
    }

    /// All declared libraries, short read lists first
    pub fn all_libraries(&self) -> impl Iterator<Item = &ReadLibraryRef> {
        self.libraries.iter().chain(self.long_read_libraries.iter())
    }
}

/// Name checks applied to caller-supplied workspace and object names
pub struct NamePatterns {
    invalid_workspace_name: Regex,
    invalid_object_name: Regex,
}

impl NamePatterns {
    pub fn new() -> Self {
        Self {
            invalid_workspace_name: Regex::new(r"[^\w:._-]").unwrap(),
            invalid_object_name: Regex::new(r"[^\w|._-]").unwrap(),
        }
    }

    pub fn is_valid_workspace_name(&self, name: &str) -> bool {
        !self.invalid_workspace_name.is_match(name)
    }

    pub fn is_valid_object_name(&self, name: &str) -> bool {
        !self.invalid_object_name.is_match(name)
    }
}

fn get_required_string<'a>(params: &'a Map<String, Value>, key: &str) -> SimpleResult<&'a str> {
    match params.get(key) {
        None | Some(Value::Null) => bail!("Parameter {key} is mandatory!"),
        Some(Value::String(x)) => {
            if x.is_empty() {
                bail!("Parameter {key} is mandatory!");
            }
            Ok(x.as_str())
        }
        Some(x) => bail!("Parameter {key} must be a string, got: {x}"),
    }
}

/// Get an optional parameter, treating an explicit null the same as an absent key
fn get_optional<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match params.get(key) {
        None | Some(Value::Null) => None,
        Some(x) => Some(x),
    }
}

/// Interpret 0/1 integers or booleans as a flag
fn get_flag(params: &Map<String, Value>, key: &str, default: bool) -> SimpleResult<bool> {
    match get_optional(params, key) {
        None => Ok(default),
        Some(Value::Bool(x)) => Ok(*x),
        Some(Value::Number(x)) => match x.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => bail!("{key} must be 0 or 1, got: {x}"),
        },
        Some(x) => bail!("{key} must be 0 or 1, got: {x}"),
    }
}

fn get_non_negative_int(params: &Map<String, Value>, key: &str) -> SimpleResult<Option<u64>> {
    match get_optional(params, key) {
        None => Ok(None),
        Some(Value::Number(x)) => match x.as_i64() {
            Some(v) if v >= 0 => Ok(Some(v as u64)),
            Some(v) => bail!("{key} must be a non-negative integer, got: {v}"),
            None => bail!("{key} must be of type int, got: {x}"),
        },
        Some(x) => bail!("{key} must be of type int, got: {x}"),
    }
}

fn get_list<'a>(params: &'a Map<String, Value>, key: &str) -> SimpleResult<&'a [Value]> {
    match get_optional(params, key) {
        None => Ok(&[]),
        Some(Value::Array(x)) => Ok(x.as_slice()),
        Some(_) => bail!("Input reads must be a list. Parameter {key} is not a list."),
    }
}

fn parse_lib_type(value: Option<&Value>, lib_ref: &str, default: LibType) -> SimpleResult<LibType> {
    match value {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(x)) => match LibType::from_str(x) {
            Ok(x) => Ok(x),
            Err(_) => bail!("Invalid library type '{x}' for reads library '{lib_ref}'"),
        },
        Some(x) => bail!("Invalid library type '{x}' for reads library '{lib_ref}'"),
    }
}

fn parse_orientation(value: Option<&Value>, lib_ref: &str) -> SimpleResult<Option<Orientation>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(x)) => match Orientation::from_str(x) {
            Ok(x) => Ok(Some(x)),
            Err(_) => bail!("Invalid orientation '{x}' for reads library '{lib_ref}'"),
        },
        Some(x) => bail!("Invalid orientation '{x}' for reads library '{lib_ref}'"),
    }
}

/// Parse one entry from a library list
///
/// Entries may be plain reference strings, or objects holding the reference under `ref_key` with an optional
/// type under `type_key` and an optional `orientation`.
///
fn parse_library_entry(
    workspace_name: &str,
    entry: &Value,
    ref_key: &str,
    type_key: &str,
    default_type: LibType,
) -> SimpleResult<Option<ReadLibraryRef>> {
    match entry {
        Value::String(x) => {
            if x.is_empty() {
                return Ok(None);
            }
            let lib_ref = normalize_lib_ref(workspace_name, x);
            Ok(Some(ReadLibraryRef::new(&lib_ref, default_type, None)))
        }
        Value::Object(x) => {
            let lib_ref = match x.get(ref_key) {
                Some(Value::String(r)) if !r.is_empty() => normalize_lib_ref(workspace_name, r),
                None | Some(Value::Null) => return Ok(None),
                Some(Value::String(_)) => return Ok(None),
                Some(r) => bail!("Reads library reference must be a string, got: {r}"),
            };
            let lib_type = parse_lib_type(x.get(type_key), &lib_ref, default_type)?;
            let orientation = parse_orientation(x.get("orientation"), &lib_ref)?;
            Ok(Some(ReadLibraryRef::new(&lib_ref, lib_type, orientation)))
        }
        x => bail!("Invalid reads library entry: {x}"),
    }
}

fn parse_library_list(
    params: &Map<String, Value>,
    workspace_name: &str,
    key: &str,
    ref_key: &str,
    type_key: &str,
    default_type: LibType,
) -> SimpleResult<Vec<ReadLibraryRef>> {
    let mut libraries = Vec::new();
    for entry in get_list(params, key)? {
        let entry = parse_library_entry(workspace_name, entry, ref_key, type_key, default_type)?;
        if let Some(x) = entry {
            libraries.push(x);
        }
    }
    Ok(libraries)
}

fn parse_kmer_sizes(params: &Map<String, Value>) -> SimpleResult<Vec<i64>> {
    let value = match get_optional(params, PARAM_KMER_SIZES) {
        Some(x) => x,
        None => return Ok(DEFAULT_KMER_SIZES.to_vec()),
    };
    let list = match value {
        Value::Array(x) => x,
        x => bail!("{PARAM_KMER_SIZES} must be a list of integers, got: {x}"),
    };
    let mut kmer_sizes = Vec::new();
    for x in list {
        match x.as_i64() {
            Some(k) => kmer_sizes.push(k),
            None => bail!("{PARAM_KMER_SIZES} must be a list of integers, found entry: {x}"),
        }
    }
    if kmer_sizes.is_empty() {
        kmer_sizes = DEFAULT_KMER_SIZES.to_vec();
    }
    Ok(kmer_sizes)
}

/// Unrecognized DNA source values are reset to none rather than rejected
fn parse_dna_source(params: &Map<String, Value>) -> DnaSource {
    match get_optional(params, PARAM_DNA_SOURCE) {
        None => DnaSource::None,
        Some(Value::String(x)) if x.is_empty() => DnaSource::None,
        Some(Value::String(x)) => match DnaSource::from_str(x) {
            Ok(x) => x,
            Err(_) => {
                warn!(
                    "Unrecognized {PARAM_DNA_SOURCE} value '{x}', assembling with no DNA source option"
                );
                DnaSource::None
            }
        },
        Some(x) => {
            warn!(
                "Unrecognized {PARAM_DNA_SOURCE} value '{x}', assembling with no DNA source option"
            );
            DnaSource::None
        }
    }
}

/// Parse pipeline options from either a single string or a list of strings
///
/// Unrecognized entries are dropped and the option list falls back to 'careful' if nothing valid remains.
///
fn parse_pipeline_options(params: &Map<String, Value>) -> Vec<PipelineOption> {
    let raw_values = match get_optional(params, PARAM_PIPELINE_OPTIONS) {
        None => Vec::new(),
        Some(Value::Array(x)) => x.iter().collect(),
        Some(x) => vec![x],
    };

    let mut options = Vec::new();
    for raw_value in raw_values {
        let option = raw_value
            .as_str()
            .and_then(|x| PipelineOption::from_str(x).ok());
        match option {
            Some(x) => {
                if !options.contains(&x) {
                    options.push(x);
                }
            }
            None => {
                warn!("Ignoring unrecognized {PARAM_PIPELINE_OPTIONS} entry: {raw_value}");
            }
        }
    }

    if options.is_empty() {
        options.push(PipelineOption::Careful);
    }
    options
}

/// Enforce library count rules for DNA source modes with restricted inputs
fn check_dna_source_cardinality(
    dna_source: DnaSource,
    libraries: &[&ReadLibraryRef],
) -> SimpleResult<()> {
    match dna_source {
        DnaSource::Metagenomic => {
            let paired_end_count = libraries
                .iter()
                .filter(|x| x.lib_type == LibType::PairedEnd)
                .count();
            if paired_end_count != 1 {
                bail!(
                    "Metagenomic assembly requires that one and only one paired end library as input. \
                    {paired_end_count} paired end libraries detected."
                );
            }
            let other_count = libraries.len() - paired_end_count;
            if other_count != 0 {
                bail!(
                    "Metagenomic assembly requires a single paired end library and no other library types. \
                    {other_count} other libraries detected."
                );
            }
        }
        DnaSource::Plasmid => {
            if libraries.len() != 1 {
                bail!(
                    "Plasmid assembly requires that one and only one library as input. {} libraries detected.",
                    libraries.len()
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_names(params: &Map<String, Value>) -> SimpleResult<(String, String)> {
    let patterns = NamePatterns::new();

    let workspace_name = get_required_string(params, PARAM_WORKSPACE_NAME)?;
    if !patterns.is_valid_workspace_name(workspace_name) {
        bail!("Invalid workspace name: {workspace_name}.");
    }

    let output_name = get_required_string(params, PARAM_OUTPUT_NAME)?;
    if !patterns.is_valid_object_name(output_name) {
        bail!("Invalid workspace object name: {output_name}.");
    }

    Ok((workspace_name.to_string(), output_name.to_string()))
}

fn as_object(raw_params: &Value) -> SimpleResult<&Map<String, Value>> {
    match raw_params {
        Value::Object(x) => Ok(x),
        _ => bail!("Assembly parameters must be a JSON object"),
    }
}

fn validate_spades_params(raw_params: &Value) -> SimpleResult<AssemblyParams> {
    let params = as_object(raw_params)?;
    let (workspace_name, output_name) = validate_names(params)?;

    let libraries = parse_library_list(
        params,
        &workspace_name,
        PARAM_READS_LIBRARIES,
        "lib_ref",
        "lib_type",
        LibType::PairedEnd,
    )?;
    let long_read_libraries = parse_library_list(
        params,
        &workspace_name,
        PARAM_LONG_READS_LIBRARIES,
        "long_reads_ref",
        "long_reads_type",
        LibType::PacbioClr,
    )?;
    if libraries.is_empty() && long_read_libraries.is_empty() {
        bail!("At least one reads library must be provided");
    }

    let min_contig_length = get_non_negative_int(params, PARAM_MIN_CONTIG_LENGTH)?.unwrap_or(0);
    let kmer_sizes = parse_kmer_sizes(params)?;
    let skip_error_correction = get_flag(params, PARAM_SKIP_ERROR_CORRECTION, false)?;
    let create_report = get_flag(params, PARAM_CREATE_REPORT, true)?;

    let dna_source = parse_dna_source(params);

    let mut pipeline_options = parse_pipeline_options(params);
    if skip_error_correction && !pipeline_options.contains(&PipelineOption::OnlyAssembler) {
        pipeline_options.push(PipelineOption::OnlyAssembler);
    }

    if dna_source == DnaSource::Metagenomic {
        pipeline_options.retain(|x| {
            let keep = !x.is_metagenome_incompatible();
            if !keep {
                info!(
                    "Removing pipeline option '{x}', which is not supported for metagenomic assembly"
                );
            }
            keep
        });
    }

    let all_libraries = libraries
        .iter()
        .chain(long_read_libraries.iter())
        .collect::<Vec<_>>();
    check_dna_source_cardinality(dna_source, &all_libraries)?;

    Ok(AssemblyParams {
        assembler: AssemblerKind::Spades,
        workspace_name,
        output_name,
        libraries,
        long_read_libraries,
        dna_source,
        min_contig_length,
        kmer_sizes,
        pipeline_options,
        skip_error_correction,
        create_report,
        unicycler: UnicyclerOptions::default(),
    })
}

fn validate_unicycler_params(raw_params: &Value) -> SimpleResult<AssemblyParams> {
    let params = as_object(raw_params)?;
    let (workspace_name, output_name) = validate_names(params)?;

    let mut libraries = parse_library_list(
        params,
        &workspace_name,
        PARAM_SHORT_PAIRED_LIBRARIES,
        "lib_ref",
        "lib_type",
        LibType::PairedEnd,
    )?;
    if libraries.is_empty() {
        bail!("At least one short paired end reads library must be provided");
    }
    if let Some(x) = libraries.iter().find(|x| x.lib_type != LibType::PairedEnd) {
        bail!(
            "Library '{}' in {PARAM_SHORT_PAIRED_LIBRARIES} has type '{}', only paired-end libraries are allowed",
            x.lib_ref,
            x.lib_type
        );
    }

    for x in get_list(params, PARAM_SHORT_UNPAIRED_LIBRARIES)? {
        let entry =
            parse_library_entry(&workspace_name, x, "lib_ref", "lib_type", LibType::Single)?;
        if let Some(x) = entry {
            libraries.push(ReadLibraryRef::new(&x.lib_ref, LibType::Single, None));
        }
    }

    let mut long_read_libraries = Vec::new();
    match get_optional(params, PARAM_LONG_READS_LIBRARY) {
        None => {}
        Some(Value::String(x)) if x.is_empty() => {}
        Some(Value::String(x)) => {
            let lib_ref = normalize_lib_ref(&workspace_name, x);
            long_read_libraries.push(ReadLibraryRef::new(&lib_ref, LibType::Nanopore, None));
        }
        Some(x) => bail!(
            "{PARAM_LONG_READS_LIBRARY} must be a single reads library reference, got: {x}"
        ),
    }

    let min_contig_length = get_non_negative_int(params, PARAM_MIN_CONTIG_LENGTH)?.unwrap_or(0);
    let num_linear_seqs = get_non_negative_int(params, PARAM_NUM_LINEAR_SEQS)?.unwrap_or(0);
    let bridging_mode = match get_optional(params, PARAM_BRIDGING_MODE) {
        None => BridgingMode::default(),
        Some(Value::String(x)) => match BridgingMode::from_str(x) {
            Ok(x) => x,
            Err(_) => bail!(
                "{PARAM_BRIDGING_MODE} must be one of conservative, normal or bold, got: {x}"
            ),
        },
        Some(x) => bail!(
            "{PARAM_BRIDGING_MODE} must be one of conservative, normal or bold, got: {x}"
        ),
    };
    let create_report = get_flag(params, PARAM_CREATE_REPORT, true)?;

    Ok(AssemblyParams {
        assembler: AssemblerKind::Unicycler,
        workspace_name,
        output_name,
        libraries,
        long_read_libraries,
        dna_source: DnaSource::None,
        min_contig_length,
        kmer_sizes: Vec::new(),
        pipeline_options: Vec::new(),
        skip_error_correction: false,
        create_report,
        unicycler: UnicyclerOptions {
            num_linear_seqs,
            bridging_mode,
        },
    })
}

/// Check raw caller parameters and convert them into validated run parameters
///
/// Validation is fail-fast: the first violated constraint is returned as an error, and no external work has
/// been started at this point.
///
pub fn validate_params(
    raw_params: &Value,
    assembler: AssemblerKind,
) -> SimpleResult<AssemblyParams> {
    match assembler {
        AssemblerKind::Spades => validate_spades_params(raw_params),
        AssemblerKind::Unicycler => validate_unicycler_params(raw_params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spades(raw: Value) -> SimpleResult<AssemblyParams> {
        validate_params(&raw, AssemblerKind::Spades)
    }

    fn error_text(result: SimpleResult<AssemblyParams>) -> String {
        match result {
            Ok(_) => panic!("expected validation failure"),
            Err(e) => e.to_string(),
        }
    }

    fn basic_params() -> Value {
        json!({
            "workspace_name": "my_ws",
            "output_contigset_name": "contigs.out",
            "reads_libraries": [{"lib_ref": "frbasic"}],
        })
    }

    #[test]
    fn test_defaults() {
        let params = spades(basic_params()).unwrap();
        assert_eq!(params.libraries.len(), 1);
        assert_eq!(params.libraries[0].lib_ref, "my_ws/frbasic");
        assert_eq!(params.libraries[0].lib_type, LibType::PairedEnd);
        assert_eq!(params.libraries[0].orientation, Some(Orientation::Fr));
        assert_eq!(params.dna_source, DnaSource::None);
        assert_eq!(params.min_contig_length, 0);
        assert_eq!(params.kmer_sizes_arg(), "21,33,55");
        assert_eq!(params.pipeline_options, vec![PipelineOption::Careful]);
        assert!(params.create_report);
        assert_eq!(params.assembly_ref(), "my_ws/contigs.out");
    }

    #[test]
    fn test_missing_workspace() {
        let mut raw = basic_params();
        raw.as_object_mut().unwrap().remove(PARAM_WORKSPACE_NAME);
        assert_eq!(
            error_text(spades(raw)),
            "Parameter workspace_name is mandatory!"
        );
    }

    #[test]
    fn test_bad_names() {
        let mut raw = basic_params();
        raw[PARAM_WORKSPACE_NAME] = json!("bad|name");
        assert_eq!(error_text(spades(raw)), "Invalid workspace name: bad|name.");

        let mut raw = basic_params();
        raw[PARAM_WORKSPACE_NAME] = json!("user:narrative_1");
        assert!(spades(raw).is_ok());

        let mut raw = basic_params();
        raw[PARAM_OUTPUT_NAME] = json!("bad*name");
        assert_eq!(
            error_text(spades(raw)),
            "Invalid workspace object name: bad*name."
        );

        let mut raw = basic_params();
        raw[PARAM_OUTPUT_NAME] = json!("a:b");
        assert!(spades(raw).is_err());

        let mut raw = basic_params();
        raw[PARAM_OUTPUT_NAME] = json!("a|b");
        assert!(spades(raw).is_ok());
    }

    #[test]
    fn test_no_libraries() {
        let mut raw = basic_params();
        raw[PARAM_READS_LIBRARIES] = json!([]);
        assert_eq!(
            error_text(spades(raw)),
            "At least one reads library must be provided"
        );

        let mut raw = basic_params();
        raw[PARAM_READS_LIBRARIES] = json!("foo");
        assert!(error_text(spades(raw)).contains("must be a list"));
    }

    #[test]
    fn test_negative_min_contig_length() {
        let mut raw = basic_params();
        raw[PARAM_MIN_CONTIG_LENGTH] = json!(-1);
        let msg = error_text(spades(raw));
        assert!(msg.contains("min_contig_length must be a non-negative integer"));

        let mut raw = basic_params();
        raw[PARAM_MIN_CONTIG_LENGTH] = json!("500");
        assert!(error_text(spades(raw)).contains("must be of type int"));
    }

    #[test]
    fn test_kmer_sizes() {
        let mut raw = basic_params();
        raw[PARAM_KMER_SIZES] = json!([21, 22, 127]);
        let params = spades(raw).unwrap();
        assert_eq!(params.kmer_sizes_arg(), "21,22,127");

        let mut raw = basic_params();
        raw[PARAM_KMER_SIZES] = json!([21, "33"]);
        assert!(error_text(spades(raw)).contains("list of integers"));
    }

    #[test]
    fn test_unknown_dna_source_reset() {
        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("martian");
        assert_eq!(spades(raw).unwrap().dna_source, DnaSource::None);

        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("metagenome");
        assert_eq!(spades(raw).unwrap().dna_source, DnaSource::Metagenomic);
    }

    #[test]
    fn test_pipeline_options() {
        let mut raw = basic_params();
        raw[PARAM_PIPELINE_OPTIONS] = json!("bogus");
        assert_eq!(
            spades(raw).unwrap().pipeline_options,
            vec![PipelineOption::Careful]
        );

        let mut raw = basic_params();
        raw[PARAM_PIPELINE_OPTIONS] =
            json!(["only-assembler", "bogus", "only-assembler", "careful"]);
        raw[PARAM_SKIP_ERROR_CORRECTION] = json!(1);
        assert_eq!(
            spades(raw).unwrap().pipeline_options,
            vec![PipelineOption::OnlyAssembler, PipelineOption::Careful]
        );
    }

    #[test]
    fn test_metagenomic_strips_careful() {
        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("metagenomic");
        raw[PARAM_PIPELINE_OPTIONS] = json!([
            "careful",
            "mismatch-correction",
            "cov-cutoff",
            "disable-gzip-output"
        ]);
        let params = spades(raw).unwrap();
        assert_eq!(params.pipeline_options, vec![PipelineOption::DisableGzipOutput]);

        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("metagenomic");
        assert!(spades(raw).unwrap().pipeline_options.is_empty());
    }

    #[test]
    fn test_metagenomic_cardinality() {
        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("metagenomic");
        raw[PARAM_READS_LIBRARIES] = json!([{"lib_ref": "pe1"}, {"lib_ref": "pe2"}]);
        let msg = error_text(spades(raw));
        assert!(msg.contains("one and only one paired end library"));
        assert!(msg.contains("2 paired end libraries detected"));

        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("metagenomic");
        raw[PARAM_READS_LIBRARIES] = json!([
            {"lib_ref": "pe1"},
            {"lib_ref": "se1", "lib_type": "single"},
        ]);
        assert!(error_text(spades(raw)).contains("1 other libraries detected"));

        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("metagenomic");
        raw[PARAM_LONG_READS_LIBRARIES] = json!([{"long_reads_ref": "clr"}]);
        assert!(error_text(spades(raw)).contains("1 other libraries detected"));
    }

    #[test]
    fn test_plasmid_cardinality() {
        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("plasmid");
        assert!(spades(raw).is_ok());

        let mut raw = basic_params();
        raw[PARAM_DNA_SOURCE] = json!("plasmid");
        raw[PARAM_READS_LIBRARIES] = json!(["a", "b", "c"]);
        let msg = error_text(spades(raw));
        assert!(msg.contains("one and only one library"));
        assert!(msg.contains("3 libraries detected"));
    }

    #[test]
    fn test_library_types() {
        let mut raw = basic_params();
        raw[PARAM_READS_LIBRARIES] = json!([
            {"lib_ref": "mp", "lib_type": "mate-pairs"},
            {"lib_ref": "pe", "lib_type": "paired-end", "orientation": "ff"},
            {"lib_ref": "ws2/ctg", "lib_type": "trusted-contigs", "orientation": "fr"},
        ]);
        raw[PARAM_LONG_READS_LIBRARIES] = json!([
            {"long_reads_ref": "ccs", "long_reads_type": "pacbio-ccs"},
            {"long_reads_ref": "ont", "long_reads_type": "nanopore"},
        ]);
        let params = spades(raw).unwrap();
        assert_eq!(params.libraries[0].orientation, Some(Orientation::Rf));
        assert_eq!(params.libraries[1].orientation, Some(Orientation::Ff));
        assert_eq!(params.libraries[2].lib_ref, "ws2/ctg");
        assert_eq!(params.libraries[2].orientation, None);
        assert_eq!(params.long_read_libraries[0].lib_type, LibType::PacbioCcs);
        assert_eq!(params.all_libraries().count(), 5);

        let mut raw = basic_params();
        raw[PARAM_READS_LIBRARIES] = json!([{"lib_ref": "x", "lib_type": "hq-mate-pairs"}]);
        assert!(error_text(spades(raw)).contains("Invalid library type"));
    }

    #[test]
    fn test_unicycler_params() {
        let raw = json!({
            "workspace_name": "ws",
            "output_contigset_name": "out",
            "short_paired_libraries": ["pe1", "pe2"],
            "short_unpaired_libraries": ["se1"],
            "long_reads_library": "ont",
            "min_contig_length": 500,
            "num_linear_seqs": 2,
            "bridging_mode": "bold",
        });
        let params = validate_params(&raw, AssemblerKind::Unicycler).unwrap();
        assert_eq!(params.libraries.len(), 3);
        assert_eq!(params.libraries[2].lib_type, LibType::Single);
        assert_eq!(params.long_read_libraries[0].lib_ref, "ws/ont");
        assert_eq!(params.min_contig_length, 500);
        assert_eq!(params.unicycler.num_linear_seqs, 2);
        assert_eq!(params.unicycler.bridging_mode, BridgingMode::Bold);

        let raw = json!({
            "workspace_name": "ws",
            "output_contigset_name": "out",
            "short_paired_libraries": ["pe1"],
            "bridging_mode": "reckless",
        });
        assert!(validate_params(&raw, AssemblerKind::Unicycler).is_err());
    }
}
