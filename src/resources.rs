//! Thread and memory budget for the external assembler
//!

use std::fs;

use log::info;
use serde::Serialize;
use simple_error::{SimpleResult, bail, try_with};
use thousands::Separable;

use crate::params::DnaSource;

pub const THREADS_PER_CORE: usize = 3;
pub const MAX_THREADS: usize = 64;
pub const MAX_THREADS_METAGENOMIC: usize = 128;

pub const GB: u64 = 1_000_000_000;
pub const MEMORY_OFFSET_GB: u64 = 1;
pub const MIN_MEMORY_GB: u64 = 5;
pub const MAX_MEMORY_GB: u64 = 500;
pub const MAX_MEMORY_GB_METAGENOMIC: u64 = 1000;

const MEMINFO_PATH: &str = "/proc/meminfo";

/// Host introspection used to size the assembler run
pub trait HostResources {
    fn cpu_count(&self) -> usize;

    /// Memory available for new processes, in bytes
    fn available_memory(&self) -> SimpleResult<u64>;
}

/// Resources of the machine running this process
pub struct SystemHost;

/// Parse the `MemAvailable` entry of a meminfo table into bytes
fn parse_mem_available(meminfo: &str) -> Option<u64> {
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let mut words = rest.split_whitespace();
            let value = words.next()?.parse::<u64>().ok()?;
            return match words.next() {
                Some("kB") => Some(value * 1024),
                None => Some(value),
                Some(_) => None,
            };
        }
    }
    None
}

impl HostResources for SystemHost {
    fn cpu_count(&self) -> usize {
        num_cpus::get()
    }

    fn available_memory(&self) -> SimpleResult<u64> {
        let meminfo = try_with!(
            fs::read_to_string(MEMINFO_PATH),
            "Unable to read available memory from '{MEMINFO_PATH}'"
        );
        match parse_mem_available(&meminfo) {
            Some(x) => Ok(x),
            None => bail!("Unable to find MemAvailable entry in '{MEMINFO_PATH}'"),
        }
    }
}

/// Thread and memory limits passed to the assembler
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceBudget {
    pub threads: usize,

    /// Memory limit in whole GB
    pub memory_gb: u64,

    pub available_memory_bytes: u64,
}

impl ResourceBudget {
    /// Derive the run budget from host resources
    ///
    /// Threads are oversubscribed relative to cores and memory leaves a fixed offset for everything else on the
    /// host. Metagenomic runs are allowed higher ceilings.
    ///
    pub fn from_host(host: &dyn HostResources, dna_source: DnaSource) -> SimpleResult<Self> {
        let is_metagenomic = dna_source == DnaSource::Metagenomic;

        let max_threads = if is_metagenomic {
            MAX_THREADS_METAGENOMIC
        } else {
            MAX_THREADS
        };
        let threads = std::cmp::min(host.cpu_count() * THREADS_PER_CORE, max_threads).max(1);

        let available_memory_bytes = host.available_memory()?;
        let memory_gb = (available_memory_bytes / GB).saturating_sub(MEMORY_OFFSET_GB);
        if memory_gb < MIN_MEMORY_GB {
            bail!(
                "Only {} bytes of memory are available. The SPAdes wrapper will not run without at least {} GB available",
                available_memory_bytes,
                MIN_MEMORY_GB + MEMORY_OFFSET_GB
            );
        }
        let max_memory_gb = if is_metagenomic {
            MAX_MEMORY_GB_METAGENOMIC
        } else {
            MAX_MEMORY_GB
        };
        let memory_gb = std::cmp::min(memory_gb, max_memory_gb);

        info!(
            "Assembler resource budget: {} threads, {} GB memory ({} bytes available)",
            threads,
            memory_gb,
            available_memory_bytes.separate_with_commas()
        );

        Ok(Self {
            threads,
            memory_gb,
            available_memory_bytes,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::FakeHost;
    use super::*;

    #[test]
    fn test_parse_mem_available() {
        let meminfo = "MemTotal:       32768000 kB\n\
                       MemFree:         1000000 kB\n\
                       MemAvailable:   16000000 kB\n";
        assert_eq!(parse_mem_available(meminfo), Some(16_384_000_000));
        assert_eq!(parse_mem_available("MemTotal: 10 kB\n"), None);
        assert_eq!(parse_mem_available("MemAvailable: abc kB\n"), None);
    }

    #[test]
    fn test_budget() {
        let host = FakeHost {
            cpus: 4,
            memory_bytes: 16_500_000_000,
        };
        let budget = ResourceBudget::from_host(&host, DnaSource::None).unwrap();
        assert_eq!(budget.threads, 12);
        assert_eq!(budget.memory_gb, 15);
    }

    #[test]
    fn test_budget_caps() {
        let host = FakeHost {
            cpus: 64,
            memory_bytes: 2_000 * GB,
        };
        let budget = ResourceBudget::from_host(&host, DnaSource::None).unwrap();
        assert_eq!(budget.threads, MAX_THREADS);
        assert_eq!(budget.memory_gb, MAX_MEMORY_GB);

        let budget = ResourceBudget::from_host(&host, DnaSource::Metagenomic).unwrap();
        assert_eq!(budget.threads, MAX_THREADS_METAGENOMIC);
        assert_eq!(budget.memory_gb, MAX_MEMORY_GB_METAGENOMIC);
    }

    #[test]
    fn test_insufficient_memory() {
        let host = FakeHost {
            cpus: 4,
            memory_bytes: 4 * GB,
        };
        let err = ResourceBudget::from_host(&host, DnaSource::None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only 4000000000 bytes of memory are available. The SPAdes wrapper will not run without at least 6 GB available"
        );

        let host = FakeHost {
            cpus: 4,
            memory_bytes: 6 * GB,
        };
        assert_eq!(
            ResourceBudget::from_host(&host, DnaSource::None)
                .unwrap()
                .memory_gb,
            5
        );
    }
}
