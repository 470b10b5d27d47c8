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

//! Uniform random subsample of the alignments in a SAM file.
//!
//! All alignment lines are read into memory and shuffled, then a prefix of
//! the shuffled lines is written after the unmodified header.

use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use bstr::BString;
use log::info;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::SubsampleConfig;
use crate::error::Result;
use crate::parser::Parser;

/// Extra lines written on top of the requested count.
///
/// Earlier releases compared the running count with `<=`, which writes
/// `count + 1` lines. Existing pipelines depend on this.
pub const INCLUSIVE_BOUNDARY_EXTRA: usize = 1;

/// Create a random number generator, seeded if `seed` is given.
#[must_use]
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Number of alignment lines written when sampling `count` out of `available`.
pub fn sample_size(count: usize, available: usize) -> usize {
    count.saturating_add(INCLUSIVE_BOUNDARY_EXTRA).min(available)
}

/// Subsample alignments from [BufRead] to [Write].
///
/// Header lines are copied as is. Every permutation of the alignment lines is
/// equally likely, and the first [sample_size] lines of the permutation are
/// written. Asking for more lines than available writes all of them.
///
/// Returns the number of alignment lines written.
///
pub fn subsample_from_read_to_write<R: BufRead, W: Write, G: Rng + ?Sized>(
    count: usize,
    rng: &mut G,
    conn_in: R,
    conn_out: &mut W,
) -> Result<usize> {
    let mut parser = Parser::new(conn_in);
    for line in parser.read_header()? {
        conn_out.write_all(&line)?;
        conn_out.write_all(b"\n")?;
    }

    let mut rows: Vec<BString> = Vec::new();
    for line in parser {
        rows.push(line?.bytes);
    }
    rows.shuffle(rng);

    let n = sample_size(count, rows.len());
    for row in &rows[..n] {
        conn_out.write_all(row)?;
        conn_out.write_all(b"\n")?;
    }
    conn_out.flush()?;

    Ok(n)
}

/// Subsamples the file at `sam`.
///
/// Writes `<dir of sam>/<out_base>_sub<count>.sam` and returns its path. If
/// the run fails the partially written output is left in place.
pub fn run(
    sam: &Path,
    out_base: &str,
    config: &SubsampleConfig,
) -> Result<PathBuf> {
    let mut rng = create_rng(config.seed);

    let out_path = crate::output_path(sam, out_base, &format!("_sub{}", config.count))?;
    let conn_in = crate::open_input(sam)?;
    let mut conn_out = crate::create_output(&out_path)?;

    let written = subsample_from_read_to_write(config.count, &mut rng, conn_in, &mut conn_out)?;
    info!("{} random alignment(s) selected.", written);

    Ok(out_path)
}
