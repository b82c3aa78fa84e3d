//! metaSPAdes compute requirement estimate
//!
//! The estimate is driven by an upper bound on the number of kmers in the input reads, using read count and mean
//! read length metadata from each library.
//!

use std::collections::BTreeMap;

use camino::Utf8Path;
use log::{debug, info};
use serde::Serialize;
use serde_json::Value;
use simple_error::{SimpleResult, bail, try_with};
use thousands::Separable;

use crate::cli::EstimateSettings;
use crate::library::normalize_lib_ref;
use crate::reads::{StagedReadsEntry, load_staged_reads_manifest};
use crate::workflow::read_params_file;

pub const ESTIMATE_KMER_LEN: u64 = 31;
pub const ESTIMATE_CPUS: usize = 16;
pub const MIN_MEMORY_MB: u64 = 4096;
pub const MIN_WALLTIME_SECONDS: u64 = 300;

const MEMORY_MB_PER_KMER: f64 = 2.962e-8;
const MEMORY_BASE: f64 = 16.3;
const MEMORY_MARGIN: f64 = 1.1;
const KMERS_PER_WALLTIME_SECOND: f64 = 100_000.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetaSpadesEstimate {
    pub cpus: usize,

    /// Memory in MB
    pub memory: u64,

    /// Walltime in seconds
    pub walltime: u64,
}

impl Default for MetaSpadesEstimate {
    fn default() -> Self {
        Self {
            cpus: ESTIMATE_CPUS,
            memory: MIN_MEMORY_MB,
            walltime: MIN_WALLTIME_SECONDS,
        }
    }
}

/// Library references from either the `reads_libraries` or the `read_libraries` parameter
fn get_library_refs(params: &serde_json::Map<String, Value>, workspace_name: &str) -> Vec<String> {
    let list = params
        .get("reads_libraries")
        .or_else(|| params.get("read_libraries"))
        .and_then(|x| x.as_array());
    let list = match list {
        Some(x) => x,
        None => return Vec::new(),
    };
    list.iter()
        .filter_map(|x| match x {
            Value::String(x) => Some(x.as_str()),
            Value::Object(x) => x.get("lib_ref").and_then(|x| x.as_str()),
            _ => None,
        })
        .filter(|x| !x.is_empty())
        .map(|x| normalize_lib_ref(workspace_name, x))
        .collect()
}

/// Upper bound on the kmer count of one library, if its metadata is complete
fn library_kmer_count(entry: Option<&StagedReadsEntry>) -> Option<f64> {
    let entry = entry?;
    let read_count = entry.read_count?;
    let read_length_mean = entry.read_length_mean?;
    let kmers_per_read = (read_length_mean - ESTIMATE_KMER_LEN as f64 + 1.0).max(0.0);
    Some(read_count as f64 * kmers_per_read)
}

/// Estimate cpus, memory and walltime needed for a metaSPAdes run
///
/// Libraries without read count or length metadata are assumed to hold the average kmer count of the others.
/// With `use_defaults` the inputs are still checked but the fixed minimum estimate is returned.
///
pub fn estimate_metaspades_requirements(
    raw_params: &Value,
    library_metadata: &BTreeMap<String, StagedReadsEntry>,
    use_defaults: bool,
) -> SimpleResult<MetaSpadesEstimate> {
    let params = match raw_params {
        Value::Object(x) => x,
        _ => bail!("Estimator parameters must be a JSON object"),
    };
    let workspace_name = match params.get("workspace_name").and_then(|x| x.as_str()) {
        Some(x) if !x.is_empty() => x,
        _ => bail!("workspace_name is required to estimate metaSPAdes requirements!"),
    };
    let library_refs = get_library_refs(params, workspace_name);
    if library_refs.is_empty() {
        bail!("At least one read library is required to estimate metaSPAdes requirements!");
    }
    if use_defaults {
        return Ok(MetaSpadesEstimate::default());
    }

    let mut kmer_counts = Vec::new();
    let mut missing_metadata_count = 0;
    for library_ref in library_refs.iter() {
        match library_kmer_count(library_metadata.get(library_ref)) {
            Some(x) => {
                debug!("Library '{library_ref}' kmer upper bound: {x}");
                kmer_counts.push(x);
            }
            None => {
                debug!("Library '{library_ref}' has no read count metadata");
                missing_metadata_count += 1;
            }
        }
    }
    if kmer_counts.is_empty() {
        bail!(
            "None of the read libraries have the read count and length metadata needed to estimate metaSPAdes requirements"
        );
    }

    let known_kmers = kmer_counts.iter().sum::<f64>();
    let average_kmers = known_kmers / kmer_counts.len() as f64;
    let total_kmers = known_kmers + average_kmers * missing_metadata_count as f64;

    let predicted_memory =
        (total_kmers * MEMORY_MB_PER_KMER + MEMORY_BASE) * MEMORY_MARGIN * 1024.0;
    let estimate = MetaSpadesEstimate {
        cpus: ESTIMATE_CPUS,
        memory: (predicted_memory as u64).max(MIN_MEMORY_MB),
        walltime: ((total_kmers / KMERS_PER_WALLTIME_SECOND) as u64).max(MIN_WALLTIME_SECONDS),
    };

    info!(
        "Estimated {} total kmers over {} libraries, {} missing metadata",
        (total_kmers as u64).separate_with_commas(),
        library_refs.len(),
        missing_metadata_count
    );
    Ok(estimate)
}

/// Run the estimate command and print the estimate to stdout in json format
pub fn run_estimate(settings: &EstimateSettings) -> SimpleResult<()> {
    let raw_params = read_params_file(Utf8Path::new(&settings.params_filename))?;
    let library_metadata = match &settings.reads_filename {
        Some(x) => load_staged_reads_manifest(Utf8Path::new(x))?,
        None => BTreeMap::new(),
    };
    let estimate =
        estimate_metaspades_requirements(&raw_params, &library_metadata, settings.use_defaults)?;
    let estimate = try_with!(
        serde_json::to_string_pretty(&estimate),
        "Unable to format metaSPAdes estimate"
    );
    println!("{estimate}");
    Ok(())
}
