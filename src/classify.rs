//! Sort resolved libraries into typed buckets
//!

use std::collections::{HashMap, HashSet};

use log::debug;
use simple_error::{SimpleResult, bail};
use strum::{EnumCount, IntoEnumIterator};

use crate::library::{LibType, ReadLibraryRef};
use crate::reads::ResolvedReadsData;

/// Resolved libraries grouped by declared type
///
/// Each bucket keeps the declaration order of its members.
///
#[derive(Debug, Default)]
pub struct LibraryBuckets {
    buckets: [Vec<ResolvedReadsData>; LibType::COUNT],
}

impl LibraryBuckets {
    pub fn get(&self, lib_type: LibType) -> &[ResolvedReadsData] {
        &self.buckets[lib_type as usize]
    }

    fn push(&mut self, data: ResolvedReadsData) {
        self.buckets[data.lib_type as usize].push(data);
    }

    /// Iterate over non-empty buckets in dataset manifest order
    pub fn iter(&self) -> impl Iterator<Item = (LibType, &[ResolvedReadsData])> {
        LibType::iter()
            .map(|x| (x, self.get(x)))
            .filter(|(_, x)| !x.is_empty())
    }

    pub fn library_count(&self) -> usize {
        self.buckets.iter().map(|x| x.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.library_count() == 0
    }
}

/// Associate each declared library with its resolved files
///
/// The declared type and orientation take precedence over anything reported by the resolver. A declared
/// library with no resolved counterpart is an error. A library declared more than once is bucketed by
/// its first declaration only, since every declaration shares the same staged files.
///
pub fn classify(
    library_entries: &[ReadLibraryRef],
    long_read_entries: &[ReadLibraryRef],
    resolved: &[ResolvedReadsData],
) -> SimpleResult<LibraryBuckets> {
    let resolved_by_ref = resolved
        .iter()
        .map(|x| (x.reads_ref.as_str(), x))
        .collect::<HashMap<_, _>>();

    let mut buckets = LibraryBuckets::default();
    let mut seen = HashSet::new();
    for entry in library_entries.iter().chain(long_read_entries.iter()) {
        if !seen.insert(entry.lib_ref.as_str()) {
            debug!(
                "Skipping repeated declaration of library '{}' as {}",
                entry.lib_ref, entry.lib_type
            );
            continue;
        }
        let data = match resolved_by_ref.get(entry.lib_ref.as_str()) {
            Some(x) => x,
            None => bail!(
                "Library '{}' was declared but could not be resolved",
                entry.lib_ref
            ),
        };
        let mut data = (*data).clone();
        data.lib_type = entry.lib_type;
        data.orientation = entry.orientation;
        debug!(
            "Classified library '{}' as {}",
            data.reads_ref, data.lib_type
        );
        buckets.push(data);
    }
    Ok(buckets)
}
