//! Assembler dataset manifest
//!
//! SPAdes accepts an arbitrary mix of libraries through a dataset file holding one descriptor object per
//! library group. The file is written as JSON, which the assembler reads as YAML.
//!

use std::fs::File;
use std::io::BufWriter;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, try_with};

use crate::classify::LibraryBuckets;
use crate::filenames::DATASET_MANIFEST_FILENAME;
use crate::library::Orientation;
use crate::reads::{ReadFiles, ResolvedReadsData};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DatasetDescriptor {
    #[serde(rename = "type")]
    pub dataset_type: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub orientation: Option<Orientation>,

    #[serde(rename = "right reads", skip_serializing_if = "Vec::is_empty", default)]
    pub right_reads: Vec<Utf8PathBuf>,

    #[serde(rename = "left reads", skip_serializing_if = "Vec::is_empty", default)]
    pub left_reads: Vec<Utf8PathBuf>,

    #[serde(rename = "interlaced reads", skip_serializing_if = "Vec::is_empty", default)]
    pub interlaced_reads: Vec<Utf8PathBuf>,

    #[serde(rename = "single reads", skip_serializing_if = "Vec::is_empty", default)]
    pub single_reads: Vec<Utf8PathBuf>,
}

impl DatasetDescriptor {
    fn new(dataset_type: &str, orientation: Option<Orientation>) -> Self {
        Self {
            dataset_type: dataset_type.to_string(),
            orientation,
            right_reads: Vec::new(),
            left_reads: Vec::new(),
            interlaced_reads: Vec::new(),
            single_reads: Vec::new(),
        }
    }
}

/// Build the descriptor for a paired bucket with a single orientation
///
/// Forward files go to the right reads list and reverse files to the left reads list. Both lists are filled
/// from the same pass so they always stay index aligned. Members delivered as one interleaved file are listed
/// as interlaced reads.
///
fn paired_descriptor(
    dataset_type: &str,
    orientation: Option<Orientation>,
    members: &[&ResolvedReadsData],
) -> DatasetDescriptor {
    let mut descriptor = DatasetDescriptor::new(dataset_type, orientation);
    for member in members {
        match &member.files {
            ReadFiles::Paired { fwd, rev } => {
                descriptor.right_reads.push(fwd.clone());
                descriptor.left_reads.push(rev.clone());
            }
            ReadFiles::Single(x) => {
                descriptor.interlaced_reads.push(x.clone());
            }
        }
    }
    descriptor
}

/// Convert library buckets into dataset descriptors, in manifest order
///
/// Paired members with differing orientations are split into one descriptor per orientation, in order of first
/// appearance.
///
pub fn build_dataset_descriptors(buckets: &LibraryBuckets) -> Vec<DatasetDescriptor> {
    let mut descriptors = Vec::new();
    for (lib_type, members) in buckets.iter() {
        let dataset_type = lib_type.dataset_type();
        if lib_type.is_paired() {
            let mut orientations = Vec::new();
            for member in members {
                if !orientations.contains(&member.orientation) {
                    orientations.push(member.orientation);
                }
            }
            for orientation in orientations {
                let group = members
                    .iter()
                    .filter(|x| x.orientation == orientation)
                    .collect::<Vec<_>>();
                descriptors.push(paired_descriptor(dataset_type, orientation, &group));
            }
        } else {
            let mut descriptor = DatasetDescriptor::new(dataset_type, None);
            for member in members {
                for path in member.files.paths() {
                    descriptor.single_reads.push(path.to_owned());
                }
            }
            descriptors.push(descriptor);
        }
    }
    descriptors
}

/// Write the dataset manifest into the run directory
///
/// Returns None without writing anything when there are no descriptors, in which case the assembler must not
/// be run.
///
pub fn write_dataset_manifest(
    descriptors: &[DatasetDescriptor],
    run_dir: &Utf8Path,
) -> SimpleResult<Option<Utf8PathBuf>> {
    if descriptors.is_empty() {
        return Ok(None);
    }

    let filename = run_dir.join(DATASET_MANIFEST_FILENAME);
    info!("Writing assembler dataset manifest to file: '{filename}'");

    let f = try_with!(
        File::create(&filename),
        "Unable to create dataset manifest file: '{filename}'"
    );
    try_with!(
        serde_json::to_writer_pretty(BufWriter::new(f), descriptors),
        "Unable to write dataset manifest file: '{filename}'"
    );
    Ok(Some(filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::library::{LibType, ReadLibraryRef};
    use crate::reads::test_utils::{paired_reads, single_reads};

    fn build_buckets(
        entries: &[ReadLibraryRef],
        resolved: &[ResolvedReadsData],
    ) -> LibraryBuckets {
        classify(entries, &[], resolved).unwrap()
    }

    #[test]
    fn test_manifest_order_and_types() {
        let entries = vec![
            ReadLibraryRef::new("ws/ctg", LibType::UntrustedContigs, None),
            ReadLibraryRef::new("ws/clr", LibType::PacbioClr, None),
            ReadLibraryRef::new("ws/ccs", LibType::PacbioCcs, None),
            ReadLibraryRef::new("ws/pe", LibType::PairedEnd, None),
            ReadLibraryRef::new("ws/se", LibType::Single, None),
        ];
        let resolved = vec![
            single_reads("ws/ctg", LibType::UntrustedContigs),
            single_reads("ws/clr", LibType::PacbioClr),
            single_reads("ws/ccs", LibType::PacbioCcs),
            paired_reads("ws/pe"),
            single_reads("ws/se", LibType::Single),
        ];
        let descriptors = build_dataset_descriptors(&build_buckets(&entries, &resolved));
        let types = descriptors
            .iter()
            .map(|x| x.dataset_type.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            types,
            vec!["single", "paired-end", "single", "pacbio", "untrusted-contigs"]
        );
        assert_eq!(descriptors[1].orientation, Some(Orientation::Fr));
        assert_eq!(descriptors[0].orientation, None);
        assert_eq!(descriptors[2].single_reads.len(), 1);
    }

    #[test]
    fn test_paired_lists_stay_aligned() {
        let entries = vec![
            ReadLibraryRef::new("ws/a", LibType::PairedEnd, None),
            ReadLibraryRef::new("ws/il", LibType::PairedEnd, None),
            ReadLibraryRef::new("ws/b", LibType::PairedEnd, None),
        ];
        let resolved = vec![
            paired_reads("ws/a"),
            single_reads("ws/il", LibType::PairedEnd),
            paired_reads("ws/b"),
        ];
        let descriptors = build_dataset_descriptors(&build_buckets(&entries, &resolved));
        assert_eq!(descriptors.len(), 1);
        let pe = &descriptors[0];
        assert_eq!(pe.right_reads.len(), 2);
        assert_eq!(pe.left_reads.len(), 2);
        assert_eq!(pe.right_reads[1].as_str(), "/staging/b.fwd.fq");
        assert_eq!(pe.left_reads[1].as_str(), "/staging/b.rev.fq");
        assert_eq!(pe.interlaced_reads[0].as_str(), "/staging/il.fq");
    }

    #[test]
    fn test_split_by_orientation() {
        let entries = vec![
            ReadLibraryRef::new("ws/a", LibType::MatePairs, None),
            ReadLibraryRef::new("ws/b", LibType::MatePairs, Some(Orientation::Fr)),
            ReadLibraryRef::new("ws/c", LibType::MatePairs, None),
        ];
        let resolved = vec![paired_reads("ws/a"), paired_reads("ws/b"), paired_reads("ws/c")];
        let descriptors = build_dataset_descriptors(&build_buckets(&entries, &resolved));
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].orientation, Some(Orientation::Rf));
        assert_eq!(descriptors[0].right_reads.len(), 2);
        assert_eq!(descriptors[1].orientation, Some(Orientation::Fr));
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = Utf8Path::from_path(dir.path()).unwrap();

        assert_eq!(write_dataset_manifest(&[], run_dir).unwrap(), None);
        assert!(!run_dir.join(DATASET_MANIFEST_FILENAME).exists());

        let entries = vec![
            ReadLibraryRef::new("ws/a", LibType::PairedEnd, None),
            ReadLibraryRef::new("ws/b", LibType::PairedEnd, None),
        ];
        let resolved = vec![paired_reads("ws/a"), paired_reads("ws/b")];
        let descriptors = build_dataset_descriptors(&build_buckets(&entries, &resolved));

        let filename = write_dataset_manifest(&descriptors, run_dir)
            .unwrap()
            .unwrap();
        assert_eq!(filename, run_dir.join(DATASET_MANIFEST_FILENAME));

        let content = std::fs::read_to_string(&filename).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["type"], "paired-end");
        assert_eq!(value[0]["orientation"], "fr");
        assert_eq!(value[0]["right reads"][0], "/staging/a.fwd.fq");
        assert_eq!(value[0]["left reads"][1], "/staging/b.rev.fq");
        assert!(value[0].get("single reads").is_none());

        let reparsed: Vec<DatasetDescriptor> = serde_json::from_str(&content).unwrap();
        assert_eq!(reparsed, descriptors);
    }
}
