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

//! samsift is a library and a command-line client for post-processing plain
//! text [SAM](https://samtools.github.io/hts-specs/SAMv1.pdf) alignments:
//!
//!   - Deleting or keeping alignments of reads listed in an identifier file.
//!   - Adding read groups to the header and to the alignments.
//!   - Drawing a uniform random subsample of the alignments.
//!
//! The input is read line by line. Apart from subsampling, memory use does
//! not depend on the number of alignments.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The samsift CLI supports the following subcommands:
//!   - `samsift filter` delete or keep alignments by read identifier.
//!   - `samsift add-rg` add read groups per read or per flowcell.
//!   - `samsift subsample` randomly select alignments.
//!
//! Output is written next to the input file, to `<out>.sam`, `<out>_rg.sam`
//! or `<out>_sub<count>.sam` respectively.
//!
//! ### Rust API
//!
//! The API provides functions operating on structs that implement [BufRead]
//! and/or [Write]:
//!
//!   - [filter_from_read_to_write]: delete or keep alignments.
//!   - [add_read_groups_to_write]: add read groups, reading the input twice.
//!   - [subsample_from_read_to_write]: subsample alignments.
//!
//! The building blocks are available for finer control:
//!
//!   - [Parser](parser::Parser): classifies lines as header or alignment.
//!   - [IdentifierSet](parser::ids::IdentifierSet): read identifiers for filtering.
//!   - [derive](group::derive): read group of an alignment under a naming [Scheme](group::Scheme).
//!   - [discover](readgroup::discover) and [rewrite](readgroup::rewrite): the two read group passes.
//!
//! Each module also has a `run` function that works on file paths and is
//! used by the CLI.
//!

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

pub mod config;
pub mod error;
pub mod filter;
pub mod group;
pub mod headers;
pub mod parser;
pub mod readgroup;
pub mod record;
pub mod subsample;

pub use config::{FilterConfig, FilterMode, Format, GroupMode, ReadGroupConfig, SubsampleConfig};
pub use error::{Error, Result};
pub use filter::filter_from_read_to_write;
pub use subsample::subsample_from_read_to_write;

use readgroup::ReadGroupSummary;

/// Path of an output file: `<dir of sam>/<out_base><suffix>.sam`.
///
/// Fails with [Error::InvalidMode] if the path is the input file itself,
/// which would be truncated before it is read.
///
/// ## Usage
///
/// ```rust
/// use samsift::output_path;
///
/// let dir = std::env::temp_dir();
/// let sam = dir.join("aln.sam");
/// std::fs::write(&sam, b"@HD\tVN:1.6\n").unwrap();
///
/// let got = output_path(&sam, "aln_filtered", "_rg").unwrap();
/// assert_eq!(got.file_name().unwrap(), "aln_filtered_rg.sam");
/// assert_eq!(got.parent().unwrap(), sam.canonicalize().unwrap().parent().unwrap());
/// ```
///
pub fn output_path(
    sam: &Path,
    out_base: &str,
    suffix: &str,
) -> Result<PathBuf> {
    let canonical = sam.canonicalize().map_err(|source| Error::Open { path: sam.to_path_buf(), source })?;
    let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
    let out_path = dir.join(format!("{}{}.sam", out_base, suffix));
    if out_path == canonical {
        return Err(Error::InvalidMode(format!("output '{}' would overwrite the input", out_path.display())))
    }
    Ok(out_path)
}

pub(crate) fn open_input(path: &Path) -> Result<BufReader<File>> {
    let f = File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
    Ok(BufReader::new(f))
}

pub(crate) fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let f = File::create(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
    Ok(BufWriter::new(f))
}

/// Add read groups to plain text SAM data.
///
/// Read groups must appear in the header before the alignments that use
/// them, so the input is needed twice: `discovery_in` is scanned for the
/// distinct read groups and `rewrite_in` is copied to `conn_out` with the
/// new header and tags. Both must read the same data.
///
/// ## Usage
///
/// ```rust
/// use samsift::{add_read_groups_to_write, Format, GroupMode, ReadGroupConfig};
/// use std::io::Cursor;
///
/// let input: &[u8] = b"@HD\tVN:1.6\n@PG\tID:pbmm2\n\
/// m1_2_3_s_4_5/ccs\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\n";
///
/// let config = ReadGroupConfig {
///     mode: GroupMode::PerRead,
///     format: Format::Ccs,
///     library: "lib".to_string(),
///     machine: "SEQUEL".to_string(),
///     expected_groups: None,
/// };
///
/// let mut output: Vec<u8> = Vec::new();
/// add_read_groups_to_write(&config, Cursor::new(input), Cursor::new(input), &mut output).unwrap();
///
/// let mut expected: Vec<u8> = Vec::new();
/// expected.append(&mut b"@HD\tVN:1.6\n".to_vec());
/// expected.append(&mut b"@RG\tID:s_4_5\tDS:READTYPE=CCS\tLB:lib\tPL:PACBIO\tPM:SEQUEL\tPU:m1_2_3\tSM:s_4_5\n".to_vec());
/// expected.append(&mut b"@PG\tID:pbmm2\n".to_vec());
/// expected.append(&mut b"m1_2_3_s_4_5/ccs\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:s_4_5\n".to_vec());
///
/// assert_eq!(output, expected);
/// ```
///
pub fn add_read_groups_to_write<R1: BufRead, R2: BufRead, W: Write>(
    config: &ReadGroupConfig,
    discovery_in: R1,
    rewrite_in: R2,
    conn_out: &mut W,
) -> Result<ReadGroupSummary> {
    let scheme = group::Scheme::select(config.mode, config.format)?;
    let groups = readgroup::discover(discovery_in, scheme, config.expected_groups)?;
    readgroup::rewrite(&groups, scheme, config, rewrite_in, conn_out)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn add_read_groups_rejects_per_read_illumina() {
        use super::add_read_groups_to_write;
        use crate::{Error, Format, GroupMode, ReadGroupConfig};
        use std::io::Cursor;

        let config = ReadGroupConfig {
            mode: GroupMode::PerRead,
            format: Format::SingleEnd,
            library: "lib".to_string(),
            machine: "HISEQ2500".to_string(),
            expected_groups: None,
        };
        let mut out: Vec<u8> = Vec::new();
        let got = add_read_groups_to_write(&config, Cursor::new(b"".to_vec()), Cursor::new(b"".to_vec()), &mut out);

        assert!(matches!(got, Err(Error::InvalidMode(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn output_path_rejects_input_file() {
        use super::output_path;
        use crate::Error;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let sam = dir.path().join("aln.sam");
        std::fs::write(&sam, b"@HD\tVN:1.6\n").unwrap();

        assert!(matches!(output_path(&sam, "aln", ""), Err(Error::InvalidMode(_))));
        assert!(output_path(&sam, "aln", "_rg").is_ok());
    }

    #[test]
    fn output_path_for_missing_input_fails() {
        use super::output_path;
        use crate::Error;
        use std::path::Path;

        let got = output_path(Path::new("/no/such/dir/aln.sam"), "out", "");
        assert!(matches!(got, Err(Error::Open { .. })));
    }
}
