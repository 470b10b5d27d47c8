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

//! Line-by-line reader for [SAM](https://samtools.github.io/hts-specs/SAMv1.pdf) text.
//!
//! [Parser] yields one classified [Line] at a time and never holds more than
//! one line of the input in memory. Header lines start with `@` and precede
//! all alignment lines. The data section begins at the first line that does
//! not start with `@`, after which every line is treated as data, including
//! any that happen to start with `@`.
//!
//! ## Usage
//!
//! ```rust
//! use samsift::parser::{LineKind, Parser};
//! use std::io::Cursor;
//!
//! let input = b"@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:100\nr1\t0\tchr1\t1\t60\t4M\t*\t0\t0\tACGT\tFFFF\n".to_vec();
//! let parser = Parser::new(Cursor::new(input));
//!
//! let kinds: Vec<LineKind> = parser.map(|line| line.unwrap().kind).collect();
//! assert_eq!(kinds, vec![LineKind::Header, LineKind::Header, LineKind::Data]);
//! ```
//!

pub mod ids;

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use bstr::BString;

use crate::error::Error;
use crate::error::Result;

/// Section of the file a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Data,
}

/// Classifies a single line by its first byte.
///
/// This looks at the line in isolation. [Parser] additionally pins every line
/// after the first data line to [LineKind::Data].
pub fn classify(line: &[u8]) -> LineKind {
    if line.first() == Some(&b'@') {
        LineKind::Header
    } else {
        LineKind::Data
    }
}

/// A line from the input without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    /// 1-based position in the input.
    pub number: usize,
    pub bytes: BString,
}

pub struct Parser<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    lookahead: Option<Line>,
    line_number: usize,
    in_data: bool,
}

impl Parser<BufReader<File>> {
    /// Opens `path` for reading.
    pub fn from_path(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;
        Ok(Self::new(BufReader::new(f)))
    }
}

impl<R: BufRead> Parser<R> {
    pub fn new(reader: R) -> Self {
        Parser {
            reader,
            buf: Vec::new(),
            lookahead: None,
            line_number: 0,
            in_data: false,
        }
    }

    /// Returns true once the first data line has been read.
    ///
    /// From this point on no further header lines are produced.
    pub fn in_data_section(&self) -> bool {
        self.in_data
    }

    /// Consumes all header lines and returns them in input order.
    ///
    /// The first data line is kept back and returned by the next call to
    /// [next](Iterator::next).
    pub fn read_header(&mut self) -> Result<Vec<BString>> {
        let mut header: Vec<BString> = Vec::new();
        while !self.in_data {
            match self.read_line()? {
                Some(line) if line.kind == LineKind::Header => header.push(line.bytes),
                Some(line) => self.lookahead = Some(line),
                None => break,
            }
        }
        Ok(header)
    }

    fn read_line(&mut self) -> Result<Option<Line>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None)
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        self.line_number += 1;

        let kind = if self.in_data { LineKind::Data } else { classify(&self.buf) };
        if kind == LineKind::Data {
            self.in_data = true;
        }

        Ok(Some(Line { kind, number: self.line_number, bytes: BString::from(self.buf.as_slice()) }))
    }
}

impl<R: BufRead> Iterator for Parser<R> {
    type Item = Result<Line>;

    fn next(
        &mut self,
    ) -> Option<Result<Line>> {
        if let Some(line) = self.lookahead.take() {
            return Some(Ok(line))
        }
        self.read_line().transpose()
    }
}
