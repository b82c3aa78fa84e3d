//! Track stats for the whole assembly run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, try_with};

use crate::filenames::RUN_STATS_FILENAME;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ResourceStats {
    pub threads: usize,
    pub memory_gb: u64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AssemblyStats {
    pub contig_count: usize,
    pub total_length: usize,
    pub n50: usize,

    /// Contigs removed by the minimum contig length filter
    pub filtered_contig_count: usize,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AssemblyRunStats {
    pub assembler: String,
    pub program_version: String,
    pub resources: ResourceStats,
    pub assembly: AssemblyStats,
    pub assembly_ref: String,
    pub report_ref: Option<String>,
    pub total_runtime_secs: f64,
}

/// Write run_stats structure out in json format
pub fn write_run_stats(output_dir: &Utf8Path, run_stats: &AssemblyRunStats) -> SimpleResult<()> {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = try_with!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );
    try_with!(
        serde_json::to_writer_pretty(&f, &run_stats),
        "Unable to write run statistics json file: '{filename}'"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn read_run_stats(output_dir: &Utf8Path) -> AssemblyRunStats {
        let file = File::open(output_dir.join(RUN_STATS_FILENAME)).unwrap();
        serde_json::from_reader(BufReader::new(file)).unwrap()
    }

    #[test]
    fn test_run_stats_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap();
        let run_stats = AssemblyRunStats {
            assembler: "SPAdes".to_string(),
            program_version: "0.3.0".to_string(),
            resources: ResourceStats {
                threads: 12,
                memory_gb: 15,
            },
            assembly: AssemblyStats {
                contig_count: 2,
                total_length: 12,
                n50: 8,
                filtered_contig_count: 0,
            },
            assembly_ref: "ws/out".to_string(),
            report_ref: None,
            total_runtime_secs: 1.5,
        };
        write_run_stats(dir, &run_stats).unwrap();
        assert_eq!(read_run_stats(dir), run_stats);
    }
}
