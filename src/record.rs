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

//! Tab-separated view of a single alignment line.
//!
//! Only the fields the engines need are interpreted: the read name, the flag
//! and optional `XX:T:value` tags. No other validation is done.

use std::io::Write;

use bstr::BStr;
use bstr::BString;
use bstr::ByteSlice;
use noodles_sam::alignment::record::Flags;

use crate::error::Error;
use crate::error::Result;

/// Index of the first optional field.
pub const OPTIONAL_FIELDS_START: usize = 11;

/// Prefix of the read group tag.
pub const READ_GROUP_TAG: &str = "RG:Z:";

/// Prefix of the supplementary alignment tag.
pub const SUPPLEMENTARY_TAG: &str = "SA:Z:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentLine {
    fields: Vec<BString>,
    number: usize,
}

impl AlignmentLine {
    /// Splits `line` on tabs. `number` is only used in error messages.
    pub fn parse(line: &[u8], number: usize) -> Self {
        let fields = line.split_str("\t").map(BString::from).collect();
        AlignmentLine { fields, number }
    }

    /// Line number in the input file.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn name(&self) -> &BStr {
        self.fields[0].as_bstr()
    }

    /// Raw text of the flag field.
    pub fn flag_text(&self) -> Result<&BStr> {
        self.fields.get(1).map(|x| x.as_bstr()).ok_or_else(|| Error::MalformedRecord {
            line: self.number,
            reason: "missing flag field".to_string(),
        })
    }

    pub fn flags(&self) -> Result<Flags> {
        let text = self.flag_text()?;
        let value = text.to_str().ok().and_then(|x| x.parse::<u16>().ok()).ok_or_else(|| Error::MalformedRecord {
            line: self.number,
            reason: format!("flag '{}' is not a number", text),
        })?;
        Ok(Flags::from(value))
    }

    fn tag_index(&self, prefix: &str) -> Option<usize> {
        self.fields.iter()
            .skip(OPTIONAL_FIELDS_START)
            .position(|field| field.starts_with_str(prefix))
            .map(|pos| pos + OPTIONAL_FIELDS_START)
    }

    /// Value of the first optional field starting with `prefix`.
    pub fn tag_value(&self, prefix: &str) -> Option<&BStr> {
        self.tag_index(prefix).map(|idx| self.fields[idx][prefix.len()..].as_bstr())
    }

    /// Removes the first optional field starting with `prefix` and returns it whole.
    pub fn remove_tag(&mut self, prefix: &str) -> Option<BString> {
        self.tag_index(prefix).map(|idx| self.fields.remove(idx))
    }

    /// Removes every optional field starting with `prefix`.
    pub fn remove_all_tags(&mut self, prefix: &str) -> usize {
        let mut removed = 0;
        while self.remove_tag(prefix).is_some() {
            removed += 1;
        }
        removed
    }

    pub fn push_field(&mut self, field: BString) {
        self.fields.push(field);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Writes the fields joined by tabs, followed by a newline.
    pub fn write_line<W: Write>(&self, conn: &mut W) -> Result<()> {
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                conn.write_all(b"\t")?;
            }
            conn.write_all(field)?;
        }
        conn.write_all(b"\n")?;
        Ok(())
    }
}

// Tests
#[cfg(test)]
mod tests {

    const LINE: &[u8] = b"m1_2_3_s_4_5/ccs\t16\tchr1\t100\t60\t4M\t*\t0\t0\tACGT\tFFFF\tNM:i:0\tRG:Z:old\tSA:Z:chr2,5,+,4M,60,0;\tAS:i:4";

    #[test]
    fn name_and_flags() {
        use super::AlignmentLine;

        let got = AlignmentLine::parse(LINE, 3);
        assert_eq!(got.name(), "m1_2_3_s_4_5/ccs");
        assert_eq!(got.flag_text().unwrap(), "16");
        assert!(got.flags().unwrap().is_reverse_complemented());
        assert!(!got.flags().unwrap().is_unmapped());
        assert_eq!(got.len(), 15);
    }

    #[test]
    fn bad_flag_reports_line_number() {
        use super::AlignmentLine;
        use crate::error::Error;

        let got = AlignmentLine::parse(b"r1\tx\tchr1", 7);
        match got.flags() {
            Err(Error::MalformedRecord { line, .. }) => assert_eq!(line, 7),
            other => panic!("unexpected {:?}", other),
        }
        assert!(AlignmentLine::parse(b"r1", 8).flags().is_err());
    }

    #[test]
    fn tag_lookup_and_removal() {
        use super::{AlignmentLine, READ_GROUP_TAG, SUPPLEMENTARY_TAG};

        let mut got = AlignmentLine::parse(LINE, 1);
        assert_eq!(got.tag_value(READ_GROUP_TAG).unwrap(), "old");

        let sa = got.remove_tag(SUPPLEMENTARY_TAG).unwrap();
        assert_eq!(sa, "SA:Z:chr2,5,+,4M,60,0;");
        assert_eq!(got.remove_all_tags(READ_GROUP_TAG), 1);
        assert!(got.tag_value(READ_GROUP_TAG).is_none());
        assert_eq!(got.len(), 13);
    }

    #[test]
    fn tags_in_mandatory_fields_are_ignored() {
        use super::{AlignmentLine, READ_GROUP_TAG};

        let got = AlignmentLine::parse(b"RG:Z:name\t0\tchr1\t1\t60\t4M\t*\t0\t0\tACGT\tFFFF", 1);
        assert!(got.tag_value(READ_GROUP_TAG).is_none());
    }

    #[test]
    fn write_line_joins_with_tabs() {
        use super::AlignmentLine;

        let got = AlignmentLine::parse(b"r1\t0\tchr1", 1);
        let mut out: Vec<u8> = Vec::new();
        got.write_line(&mut out).unwrap();
        assert_eq!(out, b"r1\t0\tchr1\n".to_vec());
    }
}
