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
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use samsift::{FilterMode, Format, GroupMode};

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Delete or keep alignments of listed reads
    Filter {
        // Input SAM file
        #[arg(long = "sam", required = true, help = "Input SAM file")]
        sam_file: PathBuf,

        // Read (or hole) ids, one per line
        #[arg(long = "ids", required = true, help = "Read ids, one per line")]
        ids_file: PathBuf,

        // delete or keep
        #[arg(long = "mode", required = true, help = "delete|keep")]
        mode: FilterMode,

        // Read naming convention
        #[arg(long = "format", default_value = "read", help = "ccs|subread|read|pe|se")]
        format: Format,

        // Output file name, .sam is appended
        #[arg(short = 'o', long = "out", required = true)]
        out_base: String,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Add read groups to the header and alignments
    AddRg {
        // Input SAM file
        #[arg(long = "sam", required = true, help = "Input SAM file")]
        sam_file: PathBuf,

        // Read group granularity
        #[arg(long = "mode", required = true, help = "read|flowcell|flowcell-dot")]
        mode: GroupMode,

        // Read naming convention
        #[arg(long = "format", required = true, help = "ccs|subread|read|pe|se")]
        format: Format,

        // Library name for LB:
        #[arg(long = "lib", required = true, help = "Library name, eg. SK1-BY_msh2d_ccs2")]
        library: String,

        // Sequencing machine for PM:
        #[arg(long = "mach", required = true, help = "Sequencing machine, eg. HISEQ2500 or SEQUEL")]
        machine: String,

        // Number of read groups in the input, flowcell-dot stops reading after this many
        #[arg(long = "rgcount", required = false)]
        rg_count: Option<usize>,

        // Output file name, _rg.sam is appended
        #[arg(short = 'o', long = "out", required = true)]
        out_base: String,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Randomly select alignments
    Subsample {
        // Input SAM file
        #[arg(long = "sam", required = true, help = "Input SAM file")]
        sam_file: PathBuf,

        // Number of alignments
        #[arg(long = "count", required = true, help = "Number of alignments to select")]
        count: usize,

        // Seed for reproducible output
        #[arg(long = "seed", required = false)]
        seed: Option<u64>,

        // Output file name, _sub<count>.sam is appended
        #[arg(short = 'o', long = "out", required = true)]
        out_base: String,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}
