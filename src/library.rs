//! Read library declarations
//!
//! These are the caller-facing descriptions of each input library, before any reads are resolved to local
//! files.
//!

use serde::{Deserialize, Serialize};

/// Library types understood by the assemblers
///
/// Variant order is the order in which libraries are written to the assembler dataset manifest.
///
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
    strum::EnumString,
)]
pub enum LibType {
    #[strum(to_string = "single")]
    #[serde(rename = "single")]
    Single,

    #[strum(to_string = "paired-end")]
    #[serde(rename = "paired-end")]
    PairedEnd,

    #[strum(to_string = "mate-pairs")]
    #[serde(rename = "mate-pairs")]
    MatePairs,

    #[strum(to_string = "pacbio-ccs", serialize = "pacbioccs")]
    #[serde(rename = "pacbio-ccs")]
    PacbioCcs,

    #[strum(to_string = "pacbio-clr", serialize = "pacbio")]
    #[serde(rename = "pacbio-clr")]
    PacbioClr,

    #[strum(to_string = "nanopore")]
    #[serde(rename = "nanopore")]
    Nanopore,

    #[strum(to_string = "sanger")]
    #[serde(rename = "sanger")]
    Sanger,

    #[strum(to_string = "trusted-contigs")]
    #[serde(rename = "trusted-contigs")]
    TrustedContigs,

    #[strum(to_string = "untrusted-contigs")]
    #[serde(rename = "untrusted-contigs")]
    UntrustedContigs,
}

impl LibType {
    /// True for library types delivered as forward/reverse mate files
    pub fn is_paired(&self) -> bool {
        matches!(self, Self::PairedEnd | Self::MatePairs)
    }

    /// True for pre-assembled sequence inputs rather than reads
    pub fn is_contigs(&self) -> bool {
        matches!(self, Self::TrustedContigs | Self::UntrustedContigs)
    }

    /// Orientation applied when the caller does not give one
    pub fn default_orientation(&self) -> Option<Orientation> {
        match self {
            Self::PairedEnd => Some(Orientation::Fr),
            Self::MatePairs => Some(Orientation::Rf),
            _ => None,
        }
    }

    /// Library type label used in the assembler dataset manifest
    ///
    /// PacBio CCS reads are accurate enough to be handed to the assembler as ordinary single reads, while
    /// CLR reads keep the dedicated long-read type.
    ///
    pub fn dataset_type(&self) -> &'static str {
        match self {
            Self::Single | Self::PacbioCcs => "single",
            Self::PairedEnd => "paired-end",
            Self::MatePairs => "mate-pairs",
            Self::PacbioClr => "pacbio",
            Self::Nanopore => "nanopore",
            Self::Sanger => "sanger",
            Self::TrustedContigs => "trusted-contigs",
            Self::UntrustedContigs => "untrusted-contigs",
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Fr,
    Rf,
    Ff,
}

/// One caller-declared read library
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReadLibraryRef {
    /// Reference in `workspace/name` form
    pub lib_ref: String,

    pub lib_type: LibType,

    /// Only set for paired library types
    pub orientation: Option<Orientation>,
}

impl ReadLibraryRef {
    /// Create a library declaration, applying the default orientation policy
    ///
    /// Paired types fall back to their default orientation, and any orientation given for a non-paired type
    /// is cleared.
    ///
    pub fn new(lib_ref: &str, lib_type: LibType, orientation: Option<Orientation>) -> Self {
        let orientation = if lib_type.is_paired() {
            orientation.or(lib_type.default_orientation())
        } else {
            None
        };
        Self {
            lib_ref: lib_ref.to_string(),
            lib_type,
            orientation,
        }
    }
}

/// Expand a bare object name into a full `workspace/name` reference
///
/// References which already contain a workspace component are returned unchanged.
///
pub fn normalize_lib_ref(workspace_name: &str, lib_ref: &str) -> String {
    if lib_ref.contains('/') {
        lib_ref.to_string()
    } else {
        format!("{workspace_name}/{lib_ref}")
    }
}
