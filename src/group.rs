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

//! Derivation of read group keys from read names.
//!
//! Each supported naming convention is a [Scheme]. All positional parsing
//! of read names lives here so that the filtering and annotation engines only
//! deal with the resulting [ReadGroup].
//!
//! ## Usage
//!
//! ```rust
//! use samsift::group::{ccs_group, flowcell_key, Scheme};
//!
//! let group = ccs_group(b"m1_2_3_sample_4_5/ccs").unwrap();
//! assert_eq!(group.id, "sample_4_5");
//! assert_eq!(group.platform_unit, "m1_2_3");
//!
//! assert_eq!(flowcell_key(b"FC001.1.2.read", Scheme::FlowcellDot).unwrap(), "FC001");
//! ```
//!

use bstr::ByteSlice;
use noodles_sam::alignment::record::Flags;

use crate::config::Format;
use crate::config::GroupMode;
use crate::error::Error;
use crate::error::Result;
use crate::record::AlignmentLine;
use crate::record::READ_GROUP_TAG;

/// Suffix of subread groups on the forward strand.
pub const FORWARD_SUFFIX: &str = "_sr_fwd";
/// Suffix of subread groups on the reverse strand.
pub const REVERSE_SUFFIX: &str = "_sr_rev";

/// Read naming scheme used to derive a group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// One group per CCS read, `<segment 3>_<segment 4>_<segment 5>`.
    Ccs,
    /// One group per subread strand, `<segment 3>_sr_fwd|_sr_rev`.
    Subread,
    /// One group per `flowcell:lane:tile` prefix.
    FlowcellColon,
    /// One group per `flowcell.` prefix.
    FlowcellDot,
}

impl Scheme {
    /// Picks the scheme for a read group run.
    ///
    /// Per-read groups are only defined for the PacBio formats.
    pub fn select(mode: GroupMode, format: Format) -> Result<Self> {
        match (mode, format) {
            (GroupMode::PerRead, Format::Ccs) => Ok(Scheme::Ccs),
            (GroupMode::PerRead, Format::Subread) => Ok(Scheme::Subread),
            (GroupMode::PerRead, other) => Err(Error::InvalidMode(
                format!("per-read groups need format 'ccs' or 'subread', got '{}'", other.as_str())
            )),
            (GroupMode::Flowcell, _) => Ok(Scheme::FlowcellColon),
            (GroupMode::FlowcellDot, _) => Ok(Scheme::FlowcellDot),
        }
    }

    pub fn is_per_read(&self) -> bool {
        matches!(self, Scheme::Ccs | Scheme::Subread)
    }

    /// Minimum number of name segments the scheme reads.
    pub fn required_segments(&self) -> usize {
        match self {
            Scheme::Ccs => 6,
            Scheme::Subread => 4,
            Scheme::FlowcellColon => 3,
            Scheme::FlowcellDot => 1,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Scheme::Ccs => write!(f, "ccs"),
            Scheme::Subread => write!(f, "subread"),
            Scheme::FlowcellColon => write!(f, "flowcell"),
            Scheme::FlowcellDot => write!(f, "flowcell-dot"),
        }
    }
}

/// A read group derived from one alignment.
///
/// `id` is used for both `ID:` and `SM:` in the header and for the `RG:Z:`
/// tag on alignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadGroup {
    pub id: String,
    pub platform_unit: String,
}

impl ReadGroup {
    /// Key used to emit each group only once.
    ///
    /// Per-read groups are unique by id. Flowcell groups are unique by the
    /// tag and flowcell pair, compared field by field.
    pub fn key(&self, scheme: Scheme) -> (String, Option<String>) {
        if scheme.is_per_read() {
            (self.id.clone(), None)
        } else {
            (self.id.clone(), Some(self.platform_unit.clone()))
        }
    }
}

fn segments(name: &[u8], separator: &str, scheme: Scheme) -> Result<Vec<String>> {
    let segs: Vec<String> = name.split_str(separator).map(|x| x.to_str_lossy().into_owned()).collect();
    let required = scheme.required_segments();
    if segs.len() < required {
        return Err(Error::MalformedName {
            name: name.to_str_lossy().into_owned(),
            scheme: scheme.to_string(),
            required,
            found: segs.len(),
        })
    }
    Ok(segs)
}

fn underscore_segments(name: &[u8], scheme: Scheme) -> Result<Vec<String>> {
    let normalized = name.replace("/", "_");
    segments(&normalized, "_", scheme)
}

/// Group of a CCS read.
pub fn ccs_group(name: &[u8]) -> Result<ReadGroup> {
    let segs = underscore_segments(name, Scheme::Ccs)?;
    Ok(ReadGroup {
        id: segs[3..6].join("_"),
        platform_unit: segs[0..3].join("_"),
    })
}

/// Group of a subread, split by strand.
///
/// Only flags 0 and 2048 count as forward.
pub fn subread_group(name: &[u8], flags: Flags) -> Result<ReadGroup> {
    let segs = underscore_segments(name, Scheme::Subread)?;
    let suffix = if flags.difference(Flags::SUPPLEMENTARY).is_empty() { FORWARD_SUFFIX } else { REVERSE_SUFFIX };
    Ok(ReadGroup {
        id: segs[3].clone() + suffix,
        platform_unit: segs[0..3].join("_"),
    })
}

/// Flowcell prefix of an unmodified read name.
pub fn flowcell_key(name: &[u8], scheme: Scheme) -> Result<String> {
    match scheme {
        Scheme::FlowcellColon => Ok(segments(name, ":", scheme)?[0..3].join("_")),
        Scheme::FlowcellDot => Ok(segments(name, ".", scheme)?.swap_remove(0)),
        _ => Err(Error::InvalidMode(format!("{} is not a flowcell scheme", scheme))),
    }
}

/// Derives the read group of `record` under `scheme`.
///
/// Flowcell schemes take the group id from the `RG:Z:` tag already on the
/// record and fail if it is missing.
pub fn derive(record: &AlignmentLine, scheme: Scheme) -> Result<ReadGroup> {
    match scheme {
        Scheme::Ccs => ccs_group(record.name()),
        Scheme::Subread => subread_group(record.name(), record.flags()?),
        Scheme::FlowcellColon | Scheme::FlowcellDot => {
            let platform_unit = flowcell_key(record.name(), scheme)?;
            let id = record.tag_value(READ_GROUP_TAG).ok_or_else(|| Error::MalformedRecord {
                line: record.number(),
                reason: "missing RG:Z: tag".to_string(),
            })?;
            Ok(ReadGroup { id: id.trim().to_str_lossy().into_owned(), platform_unit })
        },
    }
}
