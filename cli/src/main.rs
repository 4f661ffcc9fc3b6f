//! mirror - Command-line interface for the mirroring engine.
//!
//! Mirrors a source directory into a destination, prints one line per
//! failed item and a summary, and optionally re-checks the destination.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Parser;
use mirror_engine::{
    create_job, plan_job, run_job, Direction, ExistsPolicy, ExtensionRule, JobItem, JobOptions,
    Mismatch, NameRule, ProgressCallback, RuleMode, RuleSet, SizeRule, TransferJob,
    TransferOutcome, TransferSummary,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// mirror - copy a directory tree and report the outcome of every item
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(version)]
#[command(about = "Mirror a directory tree and report per-item outcomes")]
struct Args {
    /// Source directory
    #[arg(long, value_name = "PATH")]
    src: PathBuf,

    /// Destination directory
    #[arg(long, value_name = "PATH")]
    dst: PathBuf,

    /// Which side is local: upload (source) or download (destination)
    #[arg(long, value_name = "DIRECTION", default_value = "upload")]
    direction: String,

    /// What to do with existing files: skip, overwrite, or smart
    #[arg(long, value_name = "POLICY", default_value = "skip")]
    exists: String,

    /// Only transfer files with these extensions (comma-separated)
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    include_ext: Vec<String>,

    /// Never transfer files with these extensions (comma-separated)
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    exclude_ext: Vec<String>,

    /// Skip entries whose name matches this pattern (`*` and `?` wildcards)
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Skip files smaller than this many bytes
    #[arg(long, value_name = "BYTES")]
    min_size: Option<u64>,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<u64>,

    /// Re-check the destination against the outcomes after the run
    #[arg(long)]
    verify: bool,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Console output for a running job
struct CliProgress {
    verbose: bool,
    quiet: bool,
    start_time: Instant,
}

impl CliProgress {
    fn new(verbose: bool, quiet: bool) -> Self {
        CliProgress {
            verbose,
            quiet,
            start_time: Instant::now(),
        }
    }

    fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_idx])
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let secs = elapsed.as_secs();
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, mins, secs)
        } else if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    }
}

impl ProgressCallback for CliProgress {
    fn on_job_started(&self, job: &TransferJob) {
        if self.quiet {
            return;
        }
        eprintln!("Preparing transfer...");
        eprintln!("  Source: {}", job.source_path.display());
        eprintln!("  Destination: {}", job.destination_path.display());
        eprintln!("  Direction: {}", job.direction);
        eprintln!(
            "  Total: {} across {} items",
            Self::format_bytes(job.total_bytes_to_transfer),
            job.items.len()
        );
        eprintln!();
    }

    fn on_item_started(&self, _job: &TransferJob, item_index: usize, item: &JobItem) {
        if self.verbose && !self.quiet {
            eprintln!("[{:3}] Starting: {}", item_index, item.source.name);
        }
    }

    fn on_bytes_transferred(&self, _job: &TransferJob, _item_index: usize, _bytes: u64) {}

    fn on_item_completed(&self, _job: &TransferJob, item_index: usize, outcome: &TransferOutcome) {
        if self.verbose && !self.quiet {
            eprintln!("[{:3}] {}", item_index, outcome);
        }
    }

    fn on_job_completed(&self, job: &TransferJob) {
        if self.quiet {
            return;
        }

        let summary = job.summary();
        eprintln!();
        eprintln!("Transfer complete!");
        eprintln!(
            "Summary: {} succeeded, {} skipped ({} by rule), {} failed",
            summary.succeeded, summary.skipped, summary.skipped_by_rule, summary.failed
        );
        eprintln!(
            "Bytes transferred: {}",
            Self::format_bytes(job.total_bytes_transferred)
        );
        eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));

        if summary.has_failures() {
            eprintln!();
            eprintln!("Failed items:");
            for outcome in job.outcomes().filter(|o| o.is_failed()) {
                if let Some(error) = outcome.error() {
                    eprintln!("  {}: {}", outcome.local_path(), error);
                }
            }
        }

        if let Some(mismatches) = &job.verification {
            eprintln!();
            eprintln!("Verification: {} mismatch(es)", mismatches.len());
            for mismatch in mismatches {
                eprintln!("  {}: {:?}", mismatch.expected.full_path, mismatch.diff);
            }
        }
    }
}

/// Machine-readable report printed with --json
#[derive(Serialize)]
struct Report<'a> {
    job_id: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    summary: TransferSummary,
    outcomes: Vec<&'a TransferOutcome>,
    mismatches: Option<&'a [Mismatch]>,
}

impl<'a> Report<'a> {
    fn new(job: &'a TransferJob) -> Self {
        Report {
            job_id: job.id.to_string(),
            started_at: job.start_time,
            finished_at: job.end_time,
            summary: job.summary(),
            outcomes: job.outcomes().collect(),
            mismatches: job.verification.as_deref(),
        }
    }
}

/// Route engine logs to stderr. RUST_LOG takes precedence over -v.
fn init_logging(verbosity: u8) -> Result<(), String> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mirror_engine={level},mirror={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}

/// Parse and validate command-line arguments, then run the job
fn main() {
    let args = Args::parse();

    if let Err(msg) = init_logging(args.verbose) {
        eprintln!("Warning: {}", msg);
    }

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

fn parse_direction(value: &str) -> Result<Direction, String> {
    match value.to_lowercase().as_str() {
        "upload" => Ok(Direction::Upload),
        "download" => Ok(Direction::Download),
        _ => Err(format!(
            "Invalid direction '{}'. Must be 'upload' or 'download'",
            value
        )),
    }
}

fn parse_exists_policy(value: &str) -> Result<ExistsPolicy, String> {
    match value.to_lowercase().as_str() {
        "skip" => Ok(ExistsPolicy::Skip),
        "overwrite" => Ok(ExistsPolicy::Overwrite),
        "smart" | "smart-update" => Ok(ExistsPolicy::SmartUpdate),
        _ => Err(format!(
            "Invalid exists policy '{}'. Must be 'skip', 'overwrite', or 'smart'",
            value
        )),
    }
}

fn build_rules(args: &Args) -> Result<RuleSet, String> {
    if let (Some(min), Some(max)) = (args.min_size, args.max_size) {
        if min > max {
            return Err(format!(
                "--min-size ({}) must not exceed --max-size ({})",
                min, max
            ));
        }
    }

    let mut rules = RuleSet::new();
    if !args.include_ext.is_empty() {
        rules.push(ExtensionRule::new(RuleMode::Include, &args.include_ext));
    }
    if !args.exclude_ext.is_empty() {
        rules.push(ExtensionRule::new(RuleMode::Exclude, &args.exclude_ext));
    }
    if !args.exclude.is_empty() {
        rules.push(NameRule::new(RuleMode::Exclude, args.exclude.iter().cloned()));
    }
    if args.min_size.is_some() || args.max_size.is_some() {
        rules.push(SizeRule {
            min: args.min_size,
            max: args.max_size,
        });
    }
    Ok(rules)
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    if !args.src.exists() {
        return Err(format!("Source directory does not exist: {}", args.src.display()));
    }

    if !args.src.is_dir() {
        return Err(format!("Source is not a directory: {}", args.src.display()));
    }

    if let Some(parent) = args.dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!(
                "Parent of destination does not exist: {}",
                parent.display()
            ));
        }
    }

    let direction = parse_direction(&args.direction)?;
    let options = JobOptions {
        exists_policy: parse_exists_policy(&args.exists)?,
        rules: build_rules(args)?,
        verify_after_transfer: args.verify,
    };
    tracing::debug!(
        %direction,
        policy = %options.exists_policy,
        rules = options.rules.len(),
        "options parsed"
    );

    let mut job = create_job(&args.src, &args.dst, direction, options)
        .map_err(|e| format!("Job creation failed: {}", e))?;

    plan_job(&mut job).map_err(|e| format!("Job planning failed: {}", e))?;

    let progress = CliProgress::new(args.verbose > 0, args.json);
    run_job(&mut job, Some(&progress)).map_err(|e| format!("Job execution failed: {}", e))?;

    if args.json {
        let report = serde_json::to_string_pretty(&Report::new(&job))
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        println!("{}", report);
    }

    if job.summary().has_failures() {
        return Err("One or more items failed to transfer".to_string());
    }

    match &job.verification {
        Some(mismatches) if !mismatches.is_empty() => Err(format!(
            "Destination differs from the transfer outcomes for {} item(s)",
            mismatches.len()
        )),
        _ => Ok(()),
    }
}
