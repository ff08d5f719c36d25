use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use opencov::aggregate::aggregate;
use opencov::model::rate;
use opencov::parser::parse_file;

/// opencov — query line coverage from OpenCover XML reports.
#[derive(Parser)]
#[command(name = "opencov", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-file covered/instrumented line counts across the given reports.
    Summary {
        /// Paths to OpenCover XML reports.
        #[arg(required = true)]
        reports: Vec<PathBuf>,

        /// Skip reports that fail to parse instead of aborting.
        #[arg(long)]
        keep_going: bool,
    },

    /// Line-level hit counts for one source file.
    Lines {
        /// Path to an OpenCover XML report.
        report: PathBuf,

        /// Source file path exactly as recorded in the report.
        #[arg(long)]
        file: String,
    },

    /// Aggregated coverage as JSON on stdout.
    Export {
        /// Paths to OpenCover XML reports.
        #[arg(required = true)]
        reports: Vec<PathBuf>,

        /// Skip reports that fail to parse instead of aborting.
        #[arg(long)]
        keep_going: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary {
            reports,
            keep_going,
        } => cmd_summary(&reports, keep_going),
        Commands::Lines { report, file } => cmd_lines(&report, &file),
        Commands::Export {
            reports,
            keep_going,
        } => cmd_export(&reports, keep_going),
    }
}

fn cmd_summary(reports: &[PathBuf], keep_going: bool) -> Result<()> {
    let coverage = aggregate(reports, keep_going)?;

    println!("{:<60} {:>8} {:>8} {:>8}", "FILE", "LINES", "COVERED", "RATE");
    println!("{}", "-".repeat(88));

    let mut total_lines: u64 = 0;
    let mut total_covered: u64 = 0;

    for path in coverage.files() {
        let hits = coverage.hits(path);
        let lines = hits.len() as u64;
        let covered = hits.values().filter(|&&count| count > 0).count() as u64;
        total_lines += lines;
        total_covered += covered;

        println!(
            "{:<60} {:>8} {:>8} {:>7.1}%",
            path,
            lines,
            covered,
            rate(covered, lines) * 100.0
        );
    }

    println!("{}", "-".repeat(88));
    println!(
        "{:<60} {:>8} {:>8} {:>7.1}%",
        "TOTAL",
        total_lines,
        total_covered,
        rate(total_covered, total_lines) * 100.0
    );
    Ok(())
}

fn cmd_lines(report: &PathBuf, file: &str) -> Result<()> {
    let coverage = parse_file(report)?;
    let hits = coverage.hits(file);

    if hits.is_empty() {
        println!("No coverage data for '{}'", file);
        return Ok(());
    }

    println!("{:>6}  {:>10}", "LINE", "HITS");
    println!("{}", "-".repeat(18));
    for (line, count) in hits {
        let marker = if *count > 0 { "✓" } else { "✗" };
        println!("{:>6}  {:>10}  {}", line, count, marker);
    }
    Ok(())
}

fn cmd_export(reports: &[PathBuf], keep_going: bool) -> Result<()> {
    let coverage = aggregate(reports, keep_going)?;
    let json = serde_json::to_string_pretty(&coverage).context("Failed to serialize coverage")?;
    println!("{json}");
    Ok(())
}
