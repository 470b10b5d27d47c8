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
use clap::CommandFactory;
use clap::Parser;
use log::error;
use log::info;

use samsift::{FilterConfig, ReadGroupConfig, SubsampleConfig};

mod cli;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) {
    // The binary and library share the crate name, one module filter covers both.
    if let Err(e) = stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init() {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn main() {
    let cli = cli::Cli::parse();

    // Subcommands:
    let res = match &cli.command {
        // Filter
        Some(cli::Commands::Filter {
            sam_file,
            ids_file,
            mode,
            format,
            out_base,
            verbose,
        }) => {
            init_log(if *verbose { 3 } else { 2 });

            let config = FilterConfig { mode: *mode, format: *format };
            samsift::filter::run(sam_file, ids_file, out_base, &config)
        },

        // Add read groups
        Some(cli::Commands::AddRg {
            sam_file,
            mode,
            format,
            library,
            machine,
            rg_count,
            out_base,
            verbose,
        }) => {
            init_log(if *verbose { 3 } else { 2 });

            let config = ReadGroupConfig {
                mode: *mode,
                format: *format,
                library: library.clone(),
                machine: machine.clone(),
                expected_groups: *rg_count,
            };
            samsift::readgroup::run(sam_file, out_base, &config)
        },

        // Subsample
        Some(cli::Commands::Subsample {
            sam_file,
            count,
            seed,
            out_base,
            verbose,
        }) => {
            init_log(if *verbose { 3 } else { 2 });

            let config = SubsampleConfig { count: *count, seed: *seed };
            samsift::subsample::run(sam_file, out_base, &config)
        },
        None => {
            let _ = cli::Cli::command().print_help();
            return
        },
    };

    match res {
        Ok(out_path) => info!("Wrote {}", out_path.display()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        },
    }
}
