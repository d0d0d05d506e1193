//! CLI entrypoint for `aix2john`.
//!
//! Reads one or more AIX `/etc/security/passwd` files and prints every usable
//! password hash as a `username:hash` line on stdout, ready for John the
//! Ripper. Unreadable or malformed files are reported on stderr and skipped.
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use aix2john::{engine::Engine, io::DEFAULT_MMAP_THRESHOLD_BYTES, record::Md5Mode};
use clap::Parser;
use log::{LevelFilter, error, info};

#[derive(Parser, Debug)]
#[command(
    name = "aix2john",
    version,
    about = "Extract password hashes from AIX passwd files for John the Ripper"
)]
struct Args {
    /// AIX passwd file(s), usually /etc/security/passwd
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Use this option if "lpa_options = std_hash=true" is activated
    #[arg(short = 's', long = "standard")]
    standard: bool,

    /// Override mmap threshold in bytes. If zero, disable mmap.
    #[arg(long = "mmap-threshold", default_value_t = DEFAULT_MMAP_THRESHOLD_BYTES)]
    mmap_threshold: u64,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Extract input files in parallel (output order is unchanged)
    #[arg(long = "parallel")]
    parallel: bool,

    /// Log counts of emitted and skipped entries
    #[arg(long = "log-parse-stats")]
    log_parse_stats: bool,
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

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    let threshold = if args.mmap_threshold == 0 {
        u64::MAX
    } else {
        args.mmap_threshold
    };
    let engine = Engine::new(Md5Mode::from(args.standard)).with_mmap_threshold(threshold);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let res = if args.parallel {
        engine.run_parallel(&args.files, &mut out)
    } else {
        engine.run(&args.files, &mut out)
    };
    let report = match res {
        Ok(report) => report,
        Err(e) => {
            error!("failed to write output: {:#}", e);
            return ExitCode::from(3);
        }
    };

    if args.log_parse_stats {
        info!("parse stats: {}", report.totals());
    }
    if report.all_ok() {
        ExitCode::SUCCESS
    } else {
        info!("{} of {} files failed", report.failed(), report.sources.len());
        ExitCode::FAILURE
    }
}
