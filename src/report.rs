//! Assembly summary report
//!

use std::fmt::Write;

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use simple_error::{SimpleResult, bail};

use crate::contig_stats::{ContigStats, n50, total_length};
use crate::params::{AssemblerKind, AssemblyParams};

pub const HISTOGRAM_BIN_COUNT: usize = 10;

/// Equal-width histogram over the full range of the input values
///
/// Bins are half-open except for the last bin, which also includes the maximum value.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub counts: Vec<usize>,

    /// Bin edges, one more than the bin count
    pub edges: Vec<f64>,
}

impl Histogram {
    /// Build the histogram with `bin_count` bins
    ///
    /// If all values are equal the range is widened by 0.5 on each side. `values` and `bin_count` must both be
    /// non-empty.
    ///
    pub fn new(values: &[usize], bin_count: usize) -> SimpleResult<Self> {
        if bin_count == 0 {
            bail!("Histogram bin count must be positive");
        }

        let (min, max) = match values.iter().minmax() {
            MinMaxResult::NoElements => {
                bail!("Can't build a histogram from an empty value list");
            }
            MinMaxResult::OneElement(x) => (*x as f64, *x as f64),
            MinMaxResult::MinMax(x, y) => (*x as f64, *y as f64),
        };
        let (min, max) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };

        let width = max - min;
        let edges = (0..=bin_count)
            .map(|i| min + width * (i as f64) / (bin_count as f64))
            .collect::<Vec<_>>();

        let mut counts = vec![0; bin_count];
        for &value in values {
            let value = value as f64;
            let mut bin_index = (((value - min) / width) * bin_count as f64) as usize;
            bin_index = bin_index.min(bin_count - 1);

            // Correct for rounding near bin edges
            if bin_index > 0 && value < edges[bin_index] {
                bin_index -= 1;
            } else if bin_index + 1 < bin_count && value >= edges[bin_index + 1] {
                bin_index += 1;
            }
            counts[bin_index] += 1;
        }

        Ok(Self { counts, edges })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreatedObject {
    #[serde(rename = "ref")]
    pub object_ref: String,
    pub description: String,
}

/// Report content for one finished assembly
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssemblyReport {
    pub workspace_name: String,
    pub message: String,
    pub objects_created: Vec<CreatedObject>,
    pub contig_count: usize,
    pub total_length: usize,
    pub average_length: f64,
    pub n50: usize,
    pub histogram: Histogram,
}

/// Prefix for report object names
pub fn report_name_prefix(assembler: AssemblerKind) -> String {
    format!("{}_report", assembler.to_string().to_lowercase())
}

/// Summarize contig statistics into the assembly report
///
/// * `destination` - location of the assembler results, quoted in the report text
///
pub fn build_report(
    stats: &[ContigStats],
    params: &AssemblyParams,
    destination: &str,
) -> SimpleResult<AssemblyReport> {
    if stats.is_empty() {
        bail!("Can't build an assembly report without contigs");
    }
    let lengths = stats.iter().map(|x| x.length).collect::<Vec<_>>();
    let contig_count = lengths.len();
    let total_length = total_length(stats);
    let average_length = total_length as f64 / contig_count as f64;
    let histogram = Histogram::new(&lengths, HISTOGRAM_BIN_COUNT)?;
    let assembly_ref = params.assembly_ref();

    let mut message = String::new();
    writeln!(message, "{} results saved to: {}", params.assembler, destination).unwrap();
    writeln!(message, "Assembly saved to: {assembly_ref}").unwrap();
    writeln!(message, "Assembled into {contig_count} contigs.").unwrap();
    writeln!(message, "Avg Length: {average_length:?} bp.").unwrap();
    writeln!(
        message,
        "Contig Length Distribution (# of contigs -- min to max basepairs):"
    )
    .unwrap();
    for (bin_index, count) in histogram.counts.iter().enumerate() {
        writeln!(
            message,
            "   {}\t--\t{:?} to {:?} bp",
            count,
            histogram.edges[bin_index],
            histogram.edges[bin_index + 1]
        )
        .unwrap();
    }

    Ok(AssemblyReport {
        workspace_name: params.workspace_name.clone(),
        message,
        objects_created: vec![CreatedObject {
            object_ref: assembly_ref,
            description: "Assembled contigs".to_string(),
        }],
        contig_count,
        total_length,
        average_length,
        n50: n50(stats),
        histogram,
    })
}
