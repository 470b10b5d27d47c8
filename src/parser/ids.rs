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
use std::collections::HashSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use bstr::BString;
use bstr::ByteSlice;

use crate::error::Error;
use crate::error::Result;

/// Suffix removed from identifiers under [IdScheme::Ccs].
pub const CCS_SUFFIX: &str = "/ccs";

/// Normalization applied to each identifier.
///
/// The same normalization must be applied to the keys looked up with
/// [IdentifierSet::contains], otherwise nothing will match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdScheme {
    /// Trim whitespace only.
    #[default]
    Raw,
    /// Trim and cut at the first [CCS_SUFFIX].
    Ccs,
    /// Trim and replace every `/` with `_`.
    SeparatorRewrite,
}

impl IdScheme {
    pub fn normalize(&self, id: &[u8]) -> BString {
        let id = id.trim();
        match self {
            IdScheme::Raw => BString::from(id),
            IdScheme::Ccs => {
                let end = id.find(CCS_SUFFIX).unwrap_or(id.len());
                BString::from(&id[..end])
            },
            IdScheme::SeparatorRewrite => BString::from(id.replace("/", "_")),
        }
    }
}

/// Read identifiers loaded from a side file, one per line.
#[derive(Debug, Clone, Default)]
pub struct IdentifierSet {
    ids: HashSet<BString>,
    scheme: IdScheme,
}

impl IdentifierSet {
    /// Loads identifiers from the file at `path`.
    pub fn load(path: &Path, scheme: IdScheme) -> Result<Self> {
        let f = File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
        Self::from_reader(BufReader::new(f), scheme)
    }

    /// Loads identifiers from `conn`, skipping blank lines.
    pub fn from_reader<R: BufRead>(mut conn: R, scheme: IdScheme) -> Result<Self> {
        let mut ids: HashSet<BString> = HashSet::new();
        let mut line: Vec<u8> = Vec::new();
        while conn.read_until(b'\n', &mut line)? > 0 {
            let id = scheme.normalize(&line);
            if !id.is_empty() {
                ids.insert(id);
            }
            line.clear();
        }
        Ok(IdentifierSet { ids, scheme })
    }

    pub fn contains(&self, id: &[u8]) -> bool {
        self.ids.contains(id.as_bstr())
    }

    pub fn scheme(&self) -> IdScheme {
        self.scheme
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
