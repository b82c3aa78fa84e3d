//! Contig statistics from assembler FASTA output
//!

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};

use bio::io::fasta;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use serde::Serialize;
use simple_error::{SimpleResult, bail, try_with};

use crate::filenames::FILTERED_FASTA_SUFFIX;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContigStats {
    pub id: String,
    pub length: usize,

    /// Read depth from the contig header, or 0 if not given
    pub coverage: f64,

    pub circular: bool,
}

impl ContigStats {
    /// Build contig stats from a FASTA header line with the leading '>' removed
    ///
    /// Header fields after the contig id are scanned for `depth=<value>` and `circular=true`. A trailing 'x' on
    /// the depth value is accepted.
    ///
    fn from_header(header: &str) -> Self {
        let mut words = header.split_whitespace();
        let id = words.next().unwrap_or_default().to_string();
        let mut coverage = 0.0;
        let mut circular = false;
        for word in words {
            if let Some(x) = word.strip_prefix("depth=") {
                coverage = x.trim_end_matches('x').parse::<f64>().unwrap_or(0.0);
            } else if word == "circular=true" {
                circular = true;
            }
        }
        Self {
            id,
            length: 0,
            coverage,
            circular,
        }
    }
}

fn check_contig_length(contig: &ContigStats, path: &Utf8Path) -> SimpleResult<()> {
    if contig.length == 0 {
        bail!(
            "Contig '{}' in FASTA file '{}' has no sequence",
            contig.id,
            path
        );
    }
    Ok(())
}

/// Stream a FASTA file and record the id, length and header annotations of each contig
///
/// Contigs are returned in file order. A file with no contigs, or any contig without sequence, is an error.
///
pub fn load_stats(path: &Utf8Path) -> SimpleResult<Vec<ContigStats>> {
    let f = try_with!(File::open(path), "Unable to open FASTA file '{path}'");
    let reader = BufReader::new(f);

    let mut contigs = Vec::new();
    let mut current: Option<ContigStats> = None;
    for (line_index, line) in reader.lines().enumerate() {
        let line = try_with!(line, "Unable to read FASTA file '{path}'");
        if let Some(header) = line.strip_prefix('>') {
            if let Some(contig) = current.take() {
                check_contig_length(&contig, path)?;
                contigs.push(contig);
            }
            current = Some(ContigStats::from_header(header));
        } else {
            let base_count = line.bytes().filter(|x| !x.is_ascii_whitespace()).count();
            match current.as_mut() {
                Some(contig) => contig.length += base_count,
                None => {
                    if base_count > 0 {
                        bail!(
                            "Sequence found before first header at line {} of FASTA file '{}'",
                            line_index + 1,
                            path
                        );
                    }
                }
            }
        }
    }
    match current {
        Some(contig) => {
            check_contig_length(&contig, path)?;
            contigs.push(contig);
        }
        None => bail!("No contigs found in FASTA file '{path}'"),
    }
    Ok(contigs)
}

pub fn total_length(contigs: &[ContigStats]) -> usize {
    contigs.iter().map(|x| x.length).sum()
}

/// Length of the shortest contig among the longest contigs covering half the total assembly length
pub fn n50(contigs: &[ContigStats]) -> usize {
    let mut lengths = contigs.iter().map(|x| x.length).collect::<Vec<_>>();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    let total = lengths.iter().sum::<usize>();
    let mut running_total = 0;
    for length in lengths {
        running_total += length;
        if running_total * 2 >= total {
            return length;
        }
    }
    0
}

/// Path of the length-filtered copy of a FASTA file
pub fn filtered_fasta_path(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}{FILTERED_FASTA_SUFFIX}"))
}

/// Write the contigs of at least `min_length` bases to `<path>.filtered.fa`
///
/// Returns the filtered file path and the number of contigs kept.
///
pub fn filter_fasta_by_min_length(
    path: &Utf8Path,
    min_length: u64,
) -> SimpleResult<(Utf8PathBuf, usize)> {
    let filtered_path = filtered_fasta_path(path);
    info!("Filtering contigs shorter than {min_length} bases from '{path}' into '{filtered_path}'");

    let f = try_with!(File::open(path), "Unable to open FASTA file '{path}'");
    let reader = fasta::Reader::new(BufReader::new(f));

    let f = try_with!(
        File::create(&filtered_path),
        "Unable to create filtered FASTA file '{filtered_path}'"
    );
    let mut writer = fasta::Writer::new(BufWriter::new(f));

    let mut total_count = 0;
    let mut kept_count = 0;
    for result in reader.records() {
        let record = try_with!(result, "Error during FASTA record parsing in '{path}'");
        total_count += 1;
        if record.seq().len() as u64 >= min_length {
            try_with!(
                writer.write_record(&record),
                "Unable to write filtered FASTA file '{filtered_path}'"
            );
            kept_count += 1;
        }
    }
    try_with!(writer.flush(), "Unable to write filtered FASTA file '{filtered_path}'");

    info!("Kept {kept_count} of {total_count} contigs with length of at least {min_length}");
    Ok((filtered_path, kept_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;
    use std::fs;

    fn write_fasta(dir: &tempfile::TempDir, content: &str) -> Utf8PathBuf {
        let path = Utf8Path::from_path(dir.path()).unwrap().join("contigs.fasta");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(&dir, ">contigA extra\nACGT\n>contigB\nACGT\nACGT\n");
        let stats = load_stats(&path).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].id, "contigA");
        assert_eq!(stats[0].length, 4);
        assert_eq!(stats[1].id, "contigB");
        assert_eq!(stats[1].length, 8);
        assert_eq!(total_length(&stats), 12);

        assert_eq!(load_stats(&path).unwrap(), stats);
    }

    #[test]
    fn test_load_stats_header_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(
            &dir,
            ">1 length=6 depth=1.52x circular=true\nACG TAC\n\n>2 length=3 depth=bad\nAAA",
        );
        let stats = load_stats(&path).unwrap();
        assert_eq!(stats[0].length, 6);
        assert_ulps_eq!(stats[0].coverage, 1.52);
        assert!(stats[0].circular);
        assert_ulps_eq!(stats[1].coverage, 0.0);
        assert!(!stats[1].circular);
    }

    #[test]
    fn test_load_stats_errors() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_fasta(&dir, ">a\n>b\nACGT\n");
        let err = load_stats(&path).unwrap_err();
        assert!(err.to_string().contains("Contig 'a'"));
        assert!(err.to_string().contains("has no sequence"));

        let path = write_fasta(&dir, ">a\n   \n");
        assert!(load_stats(&path).is_err());

        let path = write_fasta(&dir, "\n\n");
        assert!(load_stats(&path).unwrap_err().to_string().contains("No contigs"));

        let path = write_fasta(&dir, "ACGT\n>a\nACGT\n");
        assert!(load_stats(&path).is_err());

        assert!(load_stats(Utf8Path::new("/nonexistent/contigs.fasta")).is_err());
    }

    #[test]
    fn test_n50() {
        let make = |lengths: &[usize]| {
            lengths
                .iter()
                .enumerate()
                .map(|(i, x)| ContigStats {
                    id: i.to_string(),
                    length: *x,
                    coverage: 0.0,
                    circular: false,
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(n50(&make(&[2, 3, 4, 5, 6, 7, 8, 9, 10])), 8);
        assert_eq!(n50(&make(&[100])), 100);
        assert_eq!(n50(&[]), 0);
    }

    #[test]
    fn test_filter_fasta_by_min_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fasta(&dir, ">short\nACG\n>long desc\nACGTACGT\n>edge\nACGTA\n");
        let (filtered_path, kept_count) = filter_fasta_by_min_length(&path, 5).unwrap();
        assert_eq!(filtered_path.as_str(), format!("{path}.filtered.fa"));
        assert_eq!(kept_count, 2);

        let stats = load_stats(&filtered_path).unwrap();
        let ids = stats.iter().map(|x| x.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["long", "edge"]);
    }
}
