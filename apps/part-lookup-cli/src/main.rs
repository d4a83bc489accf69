#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use part_lookup::{PartLookupConfig, build_service};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Batch lookup of vendor part numbers against the Mouser search API
#[derive(Parser)]
#[command(name = "part-lookup-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up part numbers and print the report as JSON
    Lookup(LookupArgs),
    /// Validate configuration, print it and exit
    Check,
}

#[derive(Args)]
struct LookupArgs {
    /// Part numbers to look up
    parts: Vec<String>,

    /// File with one part number per line (`#` starts a comment)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    if let Some(path) = cli.config.as_deref()
        && !path.is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }
    let config = PartLookupConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Check => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Lookup(args) => lookup(&config, args).await,
    }
}

fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn lookup(config: &PartLookupConfig, args: LookupArgs) -> Result<ExitCode> {
    let mut parts = args.parts;
    if let Some(path) = args.file.as_deref() {
        parts.extend(read_parts_file(path)?);
    }
    if parts.is_empty() {
        anyhow::bail!("no part numbers given; pass them as arguments or with --file");
    }

    let service = build_service(config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing in-flight chunks");
            on_signal.cancel();
        }
    });

    let report = service
        .run_with_cancellation(parts, String::clone, &cancel)
        .await?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    tracing::info!(
        matched = report.matched().count(),
        unmatched = report.unmatched().count(),
        not_searched = report.not_searched().count(),
        search_failed = report.search_failed().count(),
        "lookup complete"
    );

    Ok(if report.all_succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

/// Read part numbers from a file, one per line.
fn read_parts_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read part list {}", path.display()))?;
    Ok(parse_parts(&contents))
}

fn parse_parts(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split_once('#').map_or(line, |(before, _)| before).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
