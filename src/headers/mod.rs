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

//! SAM header lines.
//!
//! Header lines are passed through as raw bytes. The only header records
//! that are looked at are:
//!
//! - `@RG` read group definitions, which are replaced when read groups are
//!   added.
//! - `@PG` program records, in front of which new read groups are written.
//!
//! New `@RG` lines are formatted by [read_group].
//!

pub mod read_group;

use bstr::ByteSlice;

/// Kind of a header line, from the two letters after `@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    ReadGroup,
    Program,
    Other,
}

pub fn header_kind(line: &[u8]) -> HeaderKind {
    if line.starts_with(b"@RG") {
        HeaderKind::ReadGroup
    } else if line.starts_with(b"@PG") {
        HeaderKind::Program
    } else {
        HeaderKind::Other
    }
}

/// First word of the `CL:` field of a `@PG` line.
///
/// This is usually the name of the aligner that produced the file.
pub fn program_command(line: &[u8]) -> Option<String> {
    line.split_str("\t")
        .find_map(|field| field.strip_prefix(b"CL:"))
        .and_then(|cl| cl.fields().next())
        .map(|x| x.to_str_lossy().into_owned())
}
