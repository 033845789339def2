//! Command line interface.
//!
//! Shared with the build script, which generates the shell completions from it, so it can only
//! depend on `clap`.

use clap::{crate_version, App, Arg};

/// Generates the command line interface.
pub fn generate_cli() -> App<'static, 'static> {
    App::new("droid-triage")
        .version(crate_version!())
        .about("Bounded-time triage of Android packages")
        .arg(
            Arg::with_name("packages")
                .help("Android packages (.apk) to analyze")
                .value_name("PACKAGE")
                .required(true)
                .multiple(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .conflicts_with("quiet")
                .help("If you'd like the analyzer to talk more than needed."),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .conflicts_with("verbose")
                .help("If you'd like a zen auditor that won't talk unless it's 100% necessary."),
        )
        .arg(
            Arg::with_name("bench")
                .long("bench")
                .help("Show benchmarks for the analysis."),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Generates the results report in JSON format."),
        )
        .arg(
            Arg::with_name("min_criticality")
                .long("min-criticality")
                .value_name("LEVEL")
                .takes_value(true)
                .possible_values(&["warning", "low", "medium", "high", "critical"])
                .case_insensitive(true)
                .help("Sets the minimum criticality of the reported findings"),
        )
        .arg(
            Arg::with_name("size_threshold")
                .long("size-threshold")
                .value_name("BYTES")
                .takes_value(true)
                .help("Packages bigger than this skip the full inspection"),
        )
        .arg(
            Arg::with_name("timeout")
                .short("t")
                .long("timeout")
                .value_name("SECONDS")
                .takes_value(true)
                .help("Time limit for the full inspection of a package"),
        )
        .arg(
            Arg::with_name("ceiling")
                .long("ceiling")
                .value_name("SECONDS")
                .takes_value(true)
                .help("Time limit for the whole analysis of a package"),
        )
        .arg(
            Arg::with_name("inspector")
                .long("inspector")
                .value_name("PROGRAM")
                .takes_value(true)
                .help("Program that extracts the package artifacts"),
        )
        .arg(
            Arg::with_name("results")
                .long("results")
                .value_name("FOLDER")
                .takes_value(true)
                .help("Folder where the reports are written"),
        )
}
