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

//! Keep or delete alignments by read identifier.
//!
//! Header lines are copied verbatim. Each alignment line is reduced to a
//! lookup key and written if the key's membership in the [IdentifierSet]
//! matches the [FilterMode]. The key depends on the [Format]:
//!
//!   - `ccs`: the hole id, ie. the second `/` separated part of the read name.
//!   - `subread`: the read name with `/` replaced by `_`.
//!   - otherwise the read name as such.
//!
//! The same key is used in both modes, so running `delete` and `keep` with
//! the same identifiers partitions the alignments.

use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use bstr::BString;
use bstr::ByteSlice;
use log::info;

use crate::config::FilterConfig;
use crate::config::FilterMode;
use crate::config::Format;
use crate::error::Error;
use crate::error::Result;
use crate::parser::LineKind;
use crate::parser::Parser;
use crate::parser::ids::IdentifierSet;
use crate::record::AlignmentLine;

/// Counts reported after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    /// Distinct identifiers loaded.
    pub ids: usize,
    /// Alignment lines read.
    pub alignments_in: usize,
    /// Alignment lines written.
    pub alignments_out: usize,
}

/// Identifier of `record` used for lookups under `format`.
pub fn filter_key(record: &AlignmentLine, format: Format) -> Result<BString> {
    let name = record.name();
    match format {
        Format::Ccs => {
            name.split_str("/").nth(1).map(BString::from).ok_or_else(|| Error::MalformedName {
                name: name.to_string(),
                scheme: "ccs hole id".to_string(),
                required: 2,
                found: 1,
            })
        },
        Format::Subread => Ok(BString::from(name.replace("/", "_"))),
        _ => Ok(BString::from(name.as_bytes())),
    }
}

fn keep_record(ids: &IdentifierSet, key: &[u8], mode: FilterMode) -> bool {
    match mode {
        FilterMode::Delete => !ids.contains(key),
        FilterMode::Keep => ids.contains(key),
    }
}

/// Filter alignments from [BufRead] to [Write].
///
/// Alignment lines are written with surrounding whitespace removed, blank
/// lines are dropped. Returns the counts of lines read and written.
///
pub fn filter_from_read_to_write<R: BufRead, W: Write>(
    ids: &IdentifierSet,
    config: &FilterConfig,
    conn_in: R,
    conn_out: &mut W,
) -> Result<FilterSummary> {
    let mut summary = FilterSummary { ids: ids.len(), ..Default::default() };

    for line in Parser::new(conn_in) {
        let line = line?;
        match line.kind {
            LineKind::Header => {
                conn_out.write_all(&line.bytes)?;
                conn_out.write_all(b"\n")?;
            },
            LineKind::Data => {
                let trimmed = line.bytes.trim();
                if trimmed.is_empty() {
                    continue;
                }
                summary.alignments_in += 1;
                let record = AlignmentLine::parse(trimmed, line.number);
                let key = filter_key(&record, config.format)?;
                if keep_record(ids, &key, config.mode) {
                    conn_out.write_all(trimmed)?;
                    conn_out.write_all(b"\n")?;
                    summary.alignments_out += 1;
                }
            },
        }
    }
    conn_out.flush()?;

    Ok(summary)
}

/// Filters the file at `sam` with identifiers from `ids_path`.
///
/// Writes `<dir of sam>/<out_base>.sam` and returns its path. If the run
/// fails the partially written output is left in place.
pub fn run(
    sam: &Path,
    ids_path: &Path,
    out_base: &str,
    config: &FilterConfig,
) -> Result<PathBuf> {
    let ids = IdentifierSet::load(ids_path, config.format.id_scheme())?;
    info!("{} read.", ids_path.display());

    let out_path = crate::output_path(sam, out_base, "")?;
    let conn_in = crate::open_input(sam)?;
    let mut conn_out = crate::create_output(&out_path)?;

    let summary = filter_from_read_to_write(&ids, config, conn_in, &mut conn_out)?;

    let verb = match config.mode {
        FilterMode::Delete => "deleted",
        FilterMode::Keep => "retained",
    };
    info!("{} read(s) {}.", summary.ids, verb);
    info!("{} alignment(s) found.", summary.alignments_out);

    Ok(out_path)
}
