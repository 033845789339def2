//! Droid Triage command line tool.

#![forbid(anonymous_parameters)]
#![warn(unused_qualifications, unused_results, missing_docs)]

use anyhow::{bail, Result};
use colored::Colorize;
use droid_triage::{analyze_package, cli, initialize_config, initialize_logger, Benchmark};
use log::{error, info};
use std::{process, time::Instant};

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        process::exit(1);
    }
}

/// Analyzes every package given in the command line.
///
/// Returns an error if any of the packages could not be analyzed at all.
fn run() -> Result<()> {
    let cli = cli::generate_cli().get_matches();
    let verbose = cli.is_present("verbose");
    initialize_logger(verbose);

    let config = initialize_config(&cli)?;
    let total_start = Instant::now();
    let mut benchmarks: Vec<(String, Vec<Benchmark>)> = Vec::new();
    let mut failed = Vec::new();

    for package in config.packages() {
        let mut package_benchmarks = Vec::with_capacity(4);
        let results = analyze_package(package, &config, &mut package_benchmarks)?;
        if results.is_failed() {
            failed.push(package.display().to_string());
        }
        if config.is_bench() {
            benchmarks.push((results.report_name().to_owned(), package_benchmarks));
        }
    }

    if config.is_bench() {
        println!();
        info!("{}", "Benchmarks:".bold());
        for (package_name, package_benchmarks) in &benchmarks {
            info!("{}:", package_name.italic());
            for bench in package_benchmarks {
                info!("\t{}", bench);
            }
        }
        info!("{}", Benchmark::new("Total time", total_start.elapsed()));
    }

    if !failed.is_empty() {
        bail!("no artifacts could be obtained for: {}", failed.join(", "));
    }

    Ok(())
}
