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
use std::io::Write;

use crate::config::ReadGroupConfig;
use crate::error::Result;
use crate::group::ReadGroup;

/// Format a synthesized `@RG` header line
///
/// Writes one line with the fields `ID`, `DS`, `LB`, `PL`, `PM`, `PU` and
/// `SM` in that order. `SM` repeats the group id. The line is written
/// directly because noodles_sam's read group map does not keep this order.
///
pub fn format_read_group_line<W: Write>(
    group: &ReadGroup,
    config: &ReadGroupConfig,
    conn: &mut W,
) -> Result<()> {
    writeln!(
        conn,
        "@RG\tID:{}\tDS:READTYPE={}\tLB:{}\tPL:{}\tPM:{}\tPU:{}\tSM:{}",
        group.id,
        config.format.read_type(),
        config.library,
        config.format.platform(),
        config.machine,
        group.platform_unit,
        group.id,
    )?;
    Ok(())
}
