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

//! Add read groups to the header and alignments of a SAM file.
//!
//! A read group must be defined in the header before any alignment refers to
//! it, and the set of groups is only known after reading every alignment.
//! The input is therefore read twice:
//!
//!   1. [discover] collects the distinct [ReadGroup]s in first-seen order.
//!   2. [rewrite] copies the file, replacing existing `@RG` lines with the
//!      discovered groups and, for per-read schemes, tagging every mapped
//!      alignment with `RG:Z:<id>`.
//!
//! Both passes stream the input one line at a time. Only the discovered
//! groups are held in memory.

use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use bstr::BString;
use bstr::ByteSlice;
use indexmap::IndexMap;
use log::debug;
use log::info;

use crate::config::GroupMode;
use crate::config::ReadGroupConfig;
use crate::error::Result;
use crate::group::derive;
use crate::group::ReadGroup;
use crate::group::Scheme;
use crate::headers::header_kind;
use crate::headers::program_command;
use crate::headers::HeaderKind;
use crate::headers::read_group::format_read_group_line;
use crate::parser::LineKind;
use crate::parser::Parser;
use crate::record::AlignmentLine;
use crate::record::READ_GROUP_TAG;
use crate::record::SUPPLEMENTARY_TAG;

/// Counts reported after adding read groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadGroupSummary {
    /// Number of `@RG` lines written to the header.
    pub groups: usize,
    /// Number of alignments that received an `RG:Z:` tag.
    pub tagged: usize,
}

impl ReadGroupSummary {
    /// Count reported to the user: tagged alignments in per-read mode,
    /// defined groups in flowcell mode.
    pub fn reported(&self, scheme: Scheme) -> usize {
        if scheme.is_per_read() { self.tagged } else { self.groups }
    }
}

/// Collect the distinct read groups referenced by the alignments in `conn_in`.
///
/// Unmapped alignments are skipped under per-read schemes. Under
/// [Scheme::FlowcellDot] reading stops as soon as `expected_groups` distinct
/// groups have been seen.
///
pub fn discover<R: BufRead>(
    conn_in: R,
    scheme: Scheme,
    expected_groups: Option<usize>,
) -> Result<Vec<ReadGroup>> {
    let limit = if scheme == Scheme::FlowcellDot { expected_groups } else { None };
    let mut groups: IndexMap<(String, Option<String>), ReadGroup> = IndexMap::new();

    for line in Parser::new(conn_in) {
        let line = line?;
        if line.kind == LineKind::Header {
            continue;
        }
        if let Some(limit) = limit {
            if groups.len() >= limit {
                debug!("Found {} read group(s), stopping at line {}.", groups.len(), line.number);
                break;
            }
        }

        let trimmed = line.bytes.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = AlignmentLine::parse(trimmed, line.number);
        if scheme.is_per_read() && record.flags()?.is_unmapped() {
            continue;
        }

        let group = derive(&record, scheme)?;
        groups.entry(group.key(scheme)).or_insert(group);
    }

    debug!("Discovered {} read group(s).", groups.len());
    Ok(groups.into_values().collect())
}

/// Replace the read group tag of `record` with one for its own read group.
///
/// Existing `RG:Z:` fields are removed. A `SA:Z:` field is moved after the
/// new tag so that it stays the last field.
///
pub fn tag_record(
    record: &mut AlignmentLine,
    scheme: Scheme,
) -> Result<ReadGroup> {
    let group = derive(record, scheme)?;
    let supplementary = record.remove_tag(SUPPLEMENTARY_TAG);
    record.remove_all_tags(READ_GROUP_TAG);
    record.push_field(BString::from(format!("{}{}", READ_GROUP_TAG, group.id)));
    if let Some(sa) = supplementary {
        record.push_field(sa);
    }
    Ok(group)
}

fn write_groups<W: Write>(
    groups: &[ReadGroup],
    config: &ReadGroupConfig,
    conn_out: &mut W,
) -> Result<()> {
    for group in groups {
        format_read_group_line(group, config, conn_out)?;
    }
    Ok(())
}

/// Copy `conn_in` to `conn_out` with the read groups from [discover].
///
/// Existing `@RG` lines are dropped. The new ones are written in front of the
/// first `@PG` line, or after the last header line if there is none.
///
/// Under per-read schemes every mapped alignment is retagged with
/// [tag_record] and unmapped alignments lose their `RG:Z:` fields. Under
/// flowcell schemes every alignment is copied as is.
///
pub fn rewrite<R: BufRead, W: Write>(
    groups: &[ReadGroup],
    scheme: Scheme,
    config: &ReadGroupConfig,
    conn_in: R,
    conn_out: &mut W,
) -> Result<ReadGroupSummary> {
    let mut summary = ReadGroupSummary { groups: groups.len(), tagged: 0 };
    let mut groups_written = false;
    let mut program_seen = false;

    for line in Parser::new(conn_in) {
        let line = line?;
        match line.kind {
            LineKind::Header => {
                match header_kind(&line.bytes) {
                    HeaderKind::ReadGroup => continue,
                    HeaderKind::Program => {
                        if !groups_written {
                            write_groups(groups, config, conn_out)?;
                            groups_written = true;
                        }
                        if !program_seen {
                            if let Some(command) = program_command(&line.bytes) {
                                info!("Aligner: {}", command);
                            }
                            program_seen = true;
                        }
                    },
                    HeaderKind::Other => (),
                }
                conn_out.write_all(&line.bytes)?;
                conn_out.write_all(b"\n")?;
            },
            LineKind::Data => {
                if !groups_written {
                    write_groups(groups, config, conn_out)?;
                    groups_written = true;
                }
                let trimmed = line.bytes.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if scheme.is_per_read() {
                    let mut record = AlignmentLine::parse(trimmed, line.number);
                    if record.flags()?.is_unmapped() {
                        // Old `@RG` lines are gone, their tags must go too.
                        record.remove_all_tags(READ_GROUP_TAG);
                    } else {
                        tag_record(&mut record, scheme)?;
                        summary.tagged += 1;
                    }
                    record.write_line(conn_out)?;
                } else {
                    conn_out.write_all(trimmed)?;
                    conn_out.write_all(b"\n")?;
                }
            },
        }
    }

    if !groups_written {
        write_groups(groups, config, conn_out)?;
    }
    conn_out.flush()?;

    Ok(summary)
}

/// Adds read groups to the file at `sam`.
///
/// Writes `<dir of sam>/<out_base>_rg.sam` and returns its path. If the run
/// fails the partially written output is left in place.
pub fn run(
    sam: &Path,
    out_base: &str,
    config: &ReadGroupConfig,
) -> Result<PathBuf> {
    let scheme = Scheme::select(config.mode, config.format)?;
    if config.mode == GroupMode::FlowcellDot && config.expected_groups.is_none() {
        debug!("No read group count given, scanning the whole file.");
    }

    let groups = discover(crate::open_input(sam)?, scheme, config.expected_groups)?;

    let out_path = crate::output_path(sam, out_base, "_rg")?;
    let mut conn_out = crate::create_output(&out_path)?;
    let summary = rewrite(&groups, scheme, config, crate::open_input(sam)?, &mut conn_out)?;

    info!("{} RG tags added.", summary.reported(scheme));
    info!("Updated alignment file saved as {}", out_path.display());

    Ok(out_path)
}

// Tests
#[cfg(test)]
mod tests {
    use crate::config::{Format, GroupMode, ReadGroupConfig};

    const CCS: &[u8] = b"@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\n@RG\tID:old\tSM:old\n@PG\tID:pbmm2\tPN:pbmm2\tCL:pbmm2 align ref.fa\n\
m1_2_3_s_4_5/ccs\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:old\n\
m1_2_3_s_4_6/ccs\t16\tchr1\t20\t60\t4M\t*\t0\t0\tACGT\tFFFF\tSA:Z:chr1,500,+,4M,60,0;\tNM:i:0\n\
m1_2_3_s_9_9/ccs\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tFFFF\n\
m1_2_3_s_4_5/ccs\t2048\tchr1\t30\t60\t4M\t*\t0\t0\tACGT\tFFFF\n";

    fn config(mode: GroupMode, format: Format, expected_groups: Option<usize>) -> ReadGroupConfig {
        ReadGroupConfig {
            mode, format,
            library: "lib".to_string(),
            machine: "SEQUEL".to_string(),
            expected_groups,
        }
    }

    fn rg_ids(output: &str) -> Vec<String> {
        output.lines()
            .filter(|x| x.starts_with("@RG"))
            .map(|x| x.split('\t').nth(1).unwrap().trim_start_matches("ID:").to_string())
            .collect()
    }

    #[test]
    fn discover_ccs_groups_in_order() {
        use super::discover;
        use crate::group::Scheme;
        use std::io::Cursor;

        let got = discover(Cursor::new(CCS), Scheme::Ccs, None).unwrap();
        let ids: Vec<&str> = got.iter().map(|x| x.id.as_str()).collect();

        assert_eq!(ids, vec!["s_4_5", "s_4_6"]);
    }

    #[test]
    fn discover_is_repeatable() {
        use super::discover;
        use crate::group::Scheme;
        use std::io::Cursor;

        let first = discover(Cursor::new(CCS), Scheme::Ccs, None).unwrap();
        let second = discover(Cursor::new(CCS), Scheme::Ccs, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rewrite_ccs() {
        use super::{discover, rewrite};
        use crate::group::Scheme;
        use std::io::Cursor;

        let config = config(GroupMode::PerRead, Format::Ccs, None);
        let groups = discover(Cursor::new(CCS), Scheme::Ccs, None).unwrap();
        let mut got: Vec<u8> = Vec::new();
        let summary = rewrite(&groups, Scheme::Ccs, &config, Cursor::new(CCS), &mut got).unwrap();

        let expected: Vec<u8> = b"@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\n\
@RG\tID:s_4_5\tDS:READTYPE=CCS\tLB:lib\tPL:PACBIO\tPM:SEQUEL\tPU:m1_2_3\tSM:s_4_5\n\
@RG\tID:s_4_6\tDS:READTYPE=CCS\tLB:lib\tPL:PACBIO\tPM:SEQUEL\tPU:m1_2_3\tSM:s_4_6\n\
@PG\tID:pbmm2\tPN:pbmm2\tCL:pbmm2 align ref.fa\n\
m1_2_3_s_4_5/ccs\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:s_4_5\n\
m1_2_3_s_4_6/ccs\t16\tchr1\t20\t60\t4M\t*\t0\t0\tACGT\tFFFF\tNM:i:0\tRG:Z:s_4_6\tSA:Z:chr1,500,+,4M,60,0;\n\
m1_2_3_s_9_9/ccs\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tFFFF\n\
m1_2_3_s_4_5/ccs\t2048\tchr1\t30\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:s_4_5\n".to_vec();

        assert_eq!(String::from_utf8(got).unwrap(), String::from_utf8(expected).unwrap());
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.tagged, 3);
        assert_eq!(summary.reported(Scheme::Ccs), 3);
    }

    #[test]
    fn every_tag_has_a_header_entry() {
        use super::{discover, rewrite};
        use crate::group::Scheme;
        use std::collections::HashSet;
        use std::io::Cursor;

        let sam: &[u8] = b"@HD\tVN:1.6\n\
m1_2_3_s/10/0_100\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\n\
m1_2_3_s/10/100_200\t16\tchr1\t20\t60\t4M\t*\t0\t0\tACGT\tFFFF\n\
m1_2_3_t/11/0_100\t2048\tchr1\t30\t60\t4M\t*\t0\t0\tACGT\tFFFF\n";
        let config = config(GroupMode::PerRead, Format::Subread, None);
        let groups = discover(Cursor::new(sam), Scheme::Subread, None).unwrap();
        let mut got: Vec<u8> = Vec::new();
        rewrite(&groups, Scheme::Subread, &config, Cursor::new(sam), &mut got).unwrap();
        let got = String::from_utf8(got).unwrap();

        let defined: HashSet<String> = rg_ids(&got).into_iter().collect();
        let used: HashSet<String> = got.lines()
            .filter(|x| !x.starts_with('@'))
            .map(|x| x.rsplit('\t').next().unwrap().trim_start_matches("RG:Z:").to_string())
            .collect();

        assert_eq!(rg_ids(&got), vec!["s_sr_fwd", "s_sr_rev", "t_sr_fwd"]);
        assert_eq!(defined, used);
    }

    #[test]
    fn unmapped_lines_lose_old_tags() {
        use super::{discover, rewrite};
        use crate::group::Scheme;
        use std::io::Cursor;

        let sam: &[u8] = b"@HD\tVN:1.6\n@RG\tID:old\n\
m1_2_3_s_4_5/ccs\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:old\n\
m1_2_3_s_9_9/ccs\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tFFFF\tRG:Z:old\tSA:Z:chr1,5,+,4M,0,0;\n";
        let config = config(GroupMode::PerRead, Format::Ccs, None);
        let groups = discover(Cursor::new(sam), Scheme::Ccs, None).unwrap();
        let mut got: Vec<u8> = Vec::new();
        let summary = rewrite(&groups, Scheme::Ccs, &config, Cursor::new(sam), &mut got).unwrap();
        let got = String::from_utf8(got).unwrap();

        assert_eq!(rg_ids(&got), vec!["s_4_5"]);
        assert!(!got.contains("RG:Z:old"));
        assert!(got.ends_with("m1_2_3_s_9_9/ccs\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tFFFF\tSA:Z:chr1,5,+,4M,0,0;\n"));
        assert_eq!(summary.tagged, 1);
    }

    #[test]
    fn flowcell_groups_with_slashes_are_not_merged() {
        use super::{discover, rewrite};
        use crate::group::Scheme;
        use std::io::Cursor;

        let sam: &[u8] = b"@HD\tVN:1.6\n\
A/B.1\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:C\n\
A.1\t0\tchr1\t20\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:B/C\n";
        let config = config(GroupMode::FlowcellDot, Format::SingleEnd, None);
        let groups = discover(Cursor::new(sam), Scheme::FlowcellDot, None).unwrap();
        let mut got: Vec<u8> = Vec::new();
        rewrite(&groups, Scheme::FlowcellDot, &config, Cursor::new(sam), &mut got).unwrap();
        let got = String::from_utf8(got).unwrap();

        assert_eq!(rg_ids(&got), vec!["C", "B/C"]);
        assert!(got.contains("\tPU:A/B\tSM:C\n"));
        assert!(got.contains("\tPU:A\tSM:B/C\n"));
    }

    #[test]
    fn groups_go_after_header_without_program_line() {
        use super::{discover, rewrite};
        use crate::group::Scheme;
        use std::io::Cursor;

        let sam: &[u8] = b"@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\nm1_2_3_s_4_5/ccs\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\n";
        let config = config(GroupMode::PerRead, Format::Ccs, None);
        let groups = discover(Cursor::new(sam), Scheme::Ccs, None).unwrap();
        let mut got: Vec<u8> = Vec::new();
        rewrite(&groups, Scheme::Ccs, &config, Cursor::new(sam), &mut got).unwrap();

        let got = String::from_utf8(got).unwrap();
        let lines: Vec<&str> = got.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("@RG\tID:s_4_5\t"));
        assert!(lines[3].ends_with("\tRG:Z:s_4_5"));
    }

    #[test]
    fn flowcell_header_only() {
        use super::{discover, rewrite};
        use crate::group::Scheme;
        use std::io::Cursor;

        let sam: &[u8] = b"@HD\tVN:1.6\n@RG\tID:lane1\n@RG\tID:lane2\n@PG\tID:bwa\n\
HWI:8:FCA:1:1\t99\tchr1\t10\t60\t4M\t=\t50\t44\tACGT\tFFFF\tRG:Z:lane1\n\
HWI:8:FCA:1:1\t147\tchr1\t50\t60\t4M\t=\t10\t-44\tACGT\tFFFF\tRG:Z:lane1\n\
HWI:9:FCB:1:2\t0\tchr1\t70\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:lane2\n";
        let config = config(GroupMode::Flowcell, Format::PairedEnd, None);
        let groups = discover(Cursor::new(sam), Scheme::FlowcellColon, None).unwrap();
        let mut got: Vec<u8> = Vec::new();
        let summary = rewrite(&groups, Scheme::FlowcellColon, &config, Cursor::new(sam), &mut got).unwrap();
        let got = String::from_utf8(got).unwrap();

        assert_eq!(rg_ids(&got), vec!["lane1", "lane2"]);
        assert!(got.contains("@RG\tID:lane2\tDS:READTYPE=PE\tLB:lib\tPL:ILLUMINA\tPM:SEQUEL\tPU:HWI_9_FCB\tSM:lane2\n"));
        assert!(got.ends_with("HWI:9:FCB:1:2\t0\tchr1\t70\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:lane2\n"));
        assert_eq!(summary.tagged, 0);
        assert_eq!(summary.reported(Scheme::FlowcellColon), 2);
    }

    #[test]
    fn flowcell_dot_stops_at_expected_count() {
        use super::discover;
        use crate::error::Error;
        use crate::group::Scheme;
        use std::io::Cursor;

        // The third alignment has no RG tag and would fail if it were read.
        let sam: &[u8] = b"@HD\tVN:1.6\n\
FC1.1\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:a\n\
FC2.1\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\tRG:Z:b\n\
FC3.1\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\n";

        let got = discover(Cursor::new(sam), Scheme::FlowcellDot, Some(2)).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].platform_unit, "FC2");

        let all = discover(Cursor::new(sam), Scheme::FlowcellDot, None);
        assert!(matches!(all, Err(Error::MalformedRecord { line: 4, .. })));
    }

    #[test]
    fn malformed_name_aborts_discovery() {
        use super::discover;
        use crate::error::Error;
        use crate::group::Scheme;
        use std::io::Cursor;

        let sam: &[u8] = b"short_name/1/ccs\t0\tchr1\t10\t60\t4M\t*\t0\t0\tACGT\tFFFF\n";
        let got = discover(Cursor::new(sam), Scheme::Ccs, None);
        assert!(matches!(got, Err(Error::MalformedName { .. })));
    }
}
