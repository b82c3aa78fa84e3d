//! Fixed filenames written to the run output directory
//!

pub const DATASET_MANIFEST_FILENAME: &str = "input_data_set.yaml";
pub const ASSEMBLER_OUTPUT_DIRNAME: &str = "assembler_output";
pub const ASSEMBLER_TMP_DIRNAME: &str = "assembler_tmp";
pub const OBJECTS_DIRNAME: &str = "objects";
pub const READS_STAGING_PREFIX: &str = "staged_reads_";
pub const RUN_SETTINGS_FILENAME: &str = "run.settings.json";
pub const RUN_STATS_FILENAME: &str = "run.stats.json";
pub const FILTERED_FASTA_SUFFIX: &str = ".filtered.fa";
