//! Assembly run orchestration shared by the spades and unicycler commands
//!

use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use camino::Utf8Path;
use log::info;
use serde_json::Value;
use simple_error::{SimpleResult, bail, try_with};

use crate::assembler::{
    AssemblerCommand, AssemblerConfig, SpadesCommand, UnicyclerCommand, run_assembler,
};
use crate::classify::{LibraryBuckets, classify};
use crate::cli::{self, AssemblyInputSettings, SpadesSettings, UnicyclerSettings};
use crate::contig_stats::{
    ContigStats, filter_fasta_by_min_length, load_stats, n50, total_length,
};
use crate::dataset::{build_dataset_descriptors, write_dataset_manifest};
use crate::filenames::OBJECTS_DIRNAME;
use crate::globals::PROGRAM_VERSION;
use crate::os_utils::find_file_dir;
use crate::params::{AssemblerKind, AssemblyParams, validate_params};
use crate::publish::{
    AssemblyPublisher, LocalPublisher, PublishedRun, publish_run, unique_report_name,
};
use crate::reads::{
    ReadsResolver, StagedReadsResolver, check_library_consistency, resolve_libraries,
};
use crate::report::{build_report, report_name_prefix};
use crate::resources::{HostResources, ResourceBudget, SystemHost};
use crate::run_stats::{AssemblyRunStats, AssemblyStats, ResourceStats, write_run_stats};

/// Everything produced by one finished assembly
pub struct AssemblyOutcome {
    pub budget: ResourceBudget,
    pub contig_stats: Vec<ContigStats>,

    /// Contigs removed by the minimum contig length filter
    pub filtered_contig_count: usize,

    pub published: PublishedRun,
}

/// Read the raw JSON assembly parameters
pub fn read_params_file(filename: &Utf8Path) -> SimpleResult<Value> {
    let f = try_with!(
        File::open(filename),
        "Unable to open assembly parameters file: '{filename}'"
    );
    let params = try_with!(
        serde_json::from_reader(BufReader::new(f)),
        "Unable to parse assembly parameters from json file: '{filename}'"
    );
    Ok(params)
}

/// Resolve, check and classify all declared reads libraries
pub fn prepare_libraries(
    params: &AssemblyParams,
    resolver: &mut dyn ReadsResolver,
) -> SimpleResult<LibraryBuckets> {
    let resolved = resolve_libraries(resolver, params.all_libraries())?;
    check_library_consistency(params, &resolved)?;
    let buckets = classify(&params.libraries, &params.long_read_libraries, &resolved)?;
    info!(
        "Classified {} reads libraries for assembly",
        buckets.library_count()
    );
    Ok(buckets)
}

/// Build the assembler command line for the classified libraries
///
/// For SPAdes this writes the dataset manifest into the run directory. For Unicycler the short reads are
/// combined into the assembler scratch directory, so the assembler directories must already exist.
///
pub fn build_assembler_command<'a>(
    params: &'a AssemblyParams,
    config: &AssemblerConfig,
    buckets: &LibraryBuckets,
) -> SimpleResult<Box<dyn AssemblerCommand + 'a>> {
    let command: Box<dyn AssemblerCommand + 'a> = match params.assembler {
        AssemblerKind::Spades => {
            let descriptors = build_dataset_descriptors(buckets);
            let dataset_manifest = match write_dataset_manifest(&descriptors, &config.run_dir)? {
                Some(x) => x,
                None => bail!("No reads libraries are available to assemble"),
            };
            let has_iontorrent_reads = buckets
                .iter()
                .flat_map(|(_, x)| x.iter())
                .any(|x| x.is_iontorrent());
            Box::new(SpadesCommand::new(
                config,
                params,
                &dataset_manifest,
                has_iontorrent_reads,
            ))
        }
        AssemblerKind::Unicycler => Box::new(UnicyclerCommand::new(
            config,
            params,
            buckets,
            &config.assembler_tmp_dir(),
        )?),
    };
    Ok(command)
}

/// Run the assembler, then summarize and publish its contigs
///
pub fn assemble_and_publish(
    params: &AssemblyParams,
    config: &AssemblerConfig,
    budget: ResourceBudget,
    command: &dyn AssemblerCommand,
    publisher: &mut dyn AssemblyPublisher,
) -> SimpleResult<AssemblyOutcome> {
    run_assembler(&budget, command, &config.run_dir)?;

    let assembler_output_dir = config.assembler_output_dir();
    let output_filename = command.output_filename();
    let mut fasta = find_file_dir(&assembler_output_dir, output_filename)?.join(output_filename);
    info!("Found {} contigs file: '{fasta}'", command.name());

    let mut filtered_contig_count = 0;
    if params.min_contig_length > 0 {
        let unfiltered_count = load_stats(&fasta)?.len();
        let (filtered_fasta, kept_count) =
            filter_fasta_by_min_length(&fasta, params.min_contig_length)?;
        filtered_contig_count = unfiltered_count - kept_count;
        fasta = filtered_fasta;
    }

    let contig_stats = load_stats(&fasta)?;
    info!(
        "Assembled {} contigs with total length {} and N50 {}",
        contig_stats.len(),
        total_length(&contig_stats),
        n50(&contig_stats)
    );

    let report = if params.create_report {
        Some(build_report(
            &contig_stats,
            params,
            assembler_output_dir.as_str(),
        )?)
    } else {
        None
    };
    let report_name = unique_report_name(&report_name_prefix(params.assembler));

    let published = publish_run(
        publisher,
        &fasta,
        &params.workspace_name,
        &params.output_name,
        report.as_ref().map(|x| (x, report_name.as_str())),
    )?;

    Ok(AssemblyOutcome {
        budget,
        contig_stats,
        filtered_contig_count,
        published,
    })
}

fn get_run_stats(
    params: &AssemblyParams,
    outcome: &AssemblyOutcome,
    start: Instant,
) -> AssemblyRunStats {
    AssemblyRunStats {
        assembler: params.assembler.to_string(),
        program_version: PROGRAM_VERSION.to_string(),
        resources: ResourceStats {
            threads: outcome.budget.threads,
            memory_gb: outcome.budget.memory_gb,
        },
        assembly: AssemblyStats {
            contig_count: outcome.contig_stats.len(),
            total_length: total_length(&outcome.contig_stats),
            n50: n50(&outcome.contig_stats),
            filtered_contig_count: outcome.filtered_contig_count,
        },
        assembly_ref: outcome.published.assembly_ref.clone(),
        report_ref: outcome.published.report_ref.clone(),
        total_runtime_secs: start.elapsed().as_secs_f64(),
    }
}

/// Full assembly run from the command-line inputs
///
/// The host resource budget is checked right after parameter validation, before any reads are staged.
///
fn run_assembly(
    input: &AssemblyInputSettings,
    config: &AssemblerConfig,
    assembler: AssemblerKind,
    host: &dyn HostResources,
) -> SimpleResult<()> {
    let start = Instant::now();

    let raw_params = read_params_file(Utf8Path::new(&input.params_filename))?;
    let params = validate_params(&raw_params, assembler)?;
    info!(
        "Assembling {} reads libraries into '{}'",
        params.libraries.len() + params.long_read_libraries.len(),
        params.assembly_ref()
    );

    let budget = ResourceBudget::from_host(host, params.dna_source)?;

    let mut resolver =
        StagedReadsResolver::from_manifest(Utf8Path::new(&input.reads_filename), &config.run_dir)?;
    let buckets = prepare_libraries(&params, &mut resolver)?;

    config.create_assembler_dirs()?;
    let command = build_assembler_command(&params, config, &buckets)?;

    let mut publisher = LocalPublisher::new(&config.run_dir.join(OBJECTS_DIRNAME));
    let outcome =
        assemble_and_publish(&params, config, budget, command.as_ref(), &mut publisher)?;

    write_run_stats(&config.run_dir, &get_run_stats(&params, &outcome, start))?;
    Ok(())
}

pub fn run_spades(settings: &SpadesSettings) -> SimpleResult<()> {
    cli::write_assembly_settings(&settings.output_dir, settings);
    run_assembly(
        &settings.input,
        &settings.assembler_config(),
        AssemblerKind::Spades,
        &SystemHost,
    )
}

pub fn run_unicycler(settings: &UnicyclerSettings) -> SimpleResult<()> {
    cli::write_assembly_settings(&settings.output_dir, settings);
    run_assembly(
        &settings.input,
        &settings.assembler_config(),
        AssemblerKind::Unicycler,
        &SystemHost,
    )
}
