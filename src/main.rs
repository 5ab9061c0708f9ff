//! CLI entrypoint for `crackstats`.
//!
//! Takes a hash dump, a cracked-hash list, a report path and a keyword of
//! interest. Loads both inputs through the library engine, prints a terminal
//! summary and writes the CSV report files next to the report path.
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use crackstats::{
    engine::Engine,
    export::save_report,
    io::DEFAULT_MMAP_THRESHOLD_BYTES,
    report::{render_no_results, render_summary_with_top},
    stats::TOP_SUMMARY,
};
use log::{LevelFilter, error, info};

#[derive(Parser, Debug)]
#[command(
    name = "crackstats",
    version,
    about = "Password reuse statistics from NTDS dumps and cracked hashes"
)]
struct Args {
    /// Hash dump (secretsdump output, bare hashes, or user:hash lines)
    hashes: PathBuf,

    /// Cracked hashes as hash:plaintext lines
    cracked: PathBuf,

    /// Report path; CSV files are written next to it using its file stem
    output: PathBuf,

    /// Keyword of interest to track in passwords (e.g. the company name)
    keyword: String,

    /// Override mmap threshold in bytes. If zero, disable mmap.
    #[arg(long = "mmap-threshold", default_value_t = DEFAULT_MMAP_THRESHOLD_BYTES)]
    mmap_threshold: u64,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Load the dump and the cracked-hash file concurrently
    #[arg(long = "parallel")]
    parallel: bool,

    /// Log counts of skipped/malformed lines encountered during parsing
    #[arg(long = "log-parse-stats")]
    log_parse_stats: bool,

    /// Limit number of entries in "Most Used Passwords"
    #[arg(long = "top", default_value_t = TOP_SUMMARY)]
    top_limit: usize,

    /// Control color output (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Suppress summary output (still writes the report)
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn verify_inputs(args: &Args) -> Result<()> {
    for p in [&args.hashes, &args.cracked] {
        if !p.is_file() {
            bail!("input file not found: {}", p.display());
        }
    }
    if args.output.file_stem().is_none() {
        bail!("report path has no file name: {}", args.output.display());
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);
    match args.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {}
    }
    if let Err(e) = verify_inputs(&args) {
        error!("{}", e);
        std::process::exit(2);
    }

    let threshold = if args.mmap_threshold == 0 {
        u64::MAX
    } else {
        args.mmap_threshold
    };
    let dumps = [&args.hashes];
    let pots = [&args.cracked];
    let mut engine = Engine::new();
    let load_res = if args.parallel {
        engine.load_from_file_paths_parallel_with_threshold(&dumps, &pots, threshold)
    } else {
        engine.load_from_file_paths_with_threshold(&dumps, &pots, threshold)
    };
    if let Err(e) = load_res {
        error!("failed to load inputs: {:#}", e);
        std::process::exit(3);
    }

    if args.log_parse_stats {
        match engine.parse_stats {
            Some(stats) => info!("parse stats: {:?}", stats),
            None => info!("parse stats: (not collected for this run)"),
        }
    }

    let analysis = match engine.analyze(Some(args.keyword.as_str())) {
        Ok(analysis) => analysis,
        Err(no_results) => {
            print!("{}", render_no_results(&no_results));
            return;
        }
    };

    if !args.quiet {
        println!("{}", render_summary_with_top(&analysis, args.top_limit));
    }

    match save_report(&analysis, &args.output) {
        Ok(paths) => {
            if !args.quiet {
                for p in paths {
                    println!("Report saved to: {}", p.display().to_string().green());
                }
            }
        }
        Err(e) => {
            error!("failed to write report {}: {:#}", args.output.display(), e);
            std::process::exit(5);
        }
    }
}
