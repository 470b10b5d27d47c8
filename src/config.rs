// samsift: Filtering and read group annotation of SAM alignment files.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//

//! Run configuration.
//!
//! The CLI builds one of [FilterConfig], [ReadGroupConfig] or
//! [SubsampleConfig] at startup and hands it by reference to the engine that
//! performs the run. Nothing in here is mutated afterwards.

use crate::error::Error;
use crate::parser::ids::IdScheme;

/// Read naming conventions of the input alignments.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// PacBio circular consensus reads (`movie/hole/ccs`)
    Ccs,
    /// PacBio subreads (`movie/hole/start_end`)
    Subread,
    /// Read names used as such
    #[default]
    Read,
    /// Illumina paired-end
    PairedEnd,
    /// Illumina single-end
    SingleEnd,
}

impl std::str::FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ccs" => Ok(Format::Ccs),
            "subread" => Ok(Format::Subread),
            "read" => Ok(Format::Read),
            "pe" => Ok(Format::PairedEnd),
            "se" => Ok(Format::SingleEnd),
            _ => Err(Error::InvalidMode(format!("'{}' is not a valid Format", s))),
        }
    }
}

impl Format {
    /// Name of the format as given on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Ccs => "ccs",
            Format::Subread => "subread",
            Format::Read => "read",
            Format::PairedEnd => "pe",
            Format::SingleEnd => "se",
        }
    }

    /// Value of `DS:READTYPE=` in synthesized read group lines.
    pub fn read_type(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Sequencing platform written to `PL:`.
    pub fn platform(&self) -> &'static str {
        match self {
            Format::Ccs | Format::Subread => "PACBIO",
            _ => "ILLUMINA",
        }
    }

    /// Normalization applied to identifiers loaded for filtering.
    pub fn id_scheme(&self) -> IdScheme {
        match self {
            Format::Ccs => IdScheme::Ccs,
            Format::Subread => IdScheme::SeparatorRewrite,
            _ => IdScheme::Raw,
        }
    }
}

/// What happens to alignments whose read is listed in the identifier file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Drop listed reads, keep the rest
    Delete,
    /// Keep listed reads, drop the rest
    Keep,
}

impl std::str::FromStr for FilterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete" => Ok(FilterMode::Delete),
            "keep" => Ok(FilterMode::Keep),
            _ => Err(Error::InvalidMode(format!("'{}' is not a valid FilterMode", s))),
        }
    }
}

/// Granularity of the synthesized read groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// One read group per read, added to the header and every alignment
    PerRead,
    /// One read group per `flowcell:lane:...` prefix, header only
    Flowcell,
    /// One read group per `flowcell.` prefix, header only
    FlowcellDot,
}

impl std::str::FromStr for GroupMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" | "addRG" => Ok(GroupMode::PerRead),
            "flowcell" | "addRGH" => Ok(GroupMode::Flowcell),
            "flowcell-dot" | "addRGHS" => Ok(GroupMode::FlowcellDot),
            _ => Err(Error::InvalidMode(format!("'{}' is not a valid GroupMode", s))),
        }
    }
}

/// Settings for [filter](crate::filter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub mode: FilterMode,
    pub format: Format,
}

/// Settings for [readgroup](crate::readgroup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGroupConfig {
    pub mode: GroupMode,
    pub format: Format,
    /// Written to `LB:`
    pub library: String,
    /// Written to `PM:`
    pub machine: String,
    /// Stop flowcell-dot discovery after this many distinct groups.
    pub expected_groups: Option<usize>,
}

/// Settings for [subsample](crate::subsample).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsampleConfig {
    pub count: usize,
    /// Seed for the permutation, OS entropy if None.
    pub seed: Option<u64>,
}
