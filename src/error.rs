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

//! Errors raised while filtering or annotating an alignment file.
//!
//! Every error aborts the current run. Output written before the error is
//! left in place, no rollback is attempted.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for samsift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for samsift operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A file could not be opened or created.
    #[error("Cannot open '{}': {source}", .path.display())]
    Open {
        /// Path that was being opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing an already open stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A read name has fewer positional segments than the naming scheme needs.
    #[error("Read name '{name}' has {found} segment(s), the {scheme} scheme needs at least {required}")]
    MalformedName {
        /// The offending read name
        name: String,
        /// Naming scheme that was applied
        scheme: String,
        /// Number of segments the scheme needs
        required: usize,
        /// Number of segments found
        found: usize,
    },

    /// Unsupported combination of operation mode and format.
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    /// An alignment line lacks a field the operation needs.
    #[error("Malformed alignment on line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the input file
        line: usize,
        /// What was missing or unparseable
        reason: String,
    },
}
