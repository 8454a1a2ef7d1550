//! breakout-screen: scan for support/resistance breakouts on one date, enrich
//! the hits and the misses with quarterly fundamentals, and write ranked tables.
//!
//! Usage:
//!   breakout-screen --date 2026-02-09
//!   breakout-screen --date 2026-02-09 --output scans/feb --with-reference
//!   breakout-screen --dry-run

use anyhow::Context;
use screen_orchestrator::{CsvDirectorySink, ScreenConfig, ScreenPipeline};
use std::path::PathBuf;

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  breakout-screen [--date YYYY-MM-DD] [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --date YYYY-MM-DD   Observation date (default: SCREEN_OBSERVATION_DATE)");
    eprintln!("  --output DIR        Output directory (default: support_resistance_scan)");
    eprintln!("  --concurrency N     Max parallel fundamental lookups (default: 8)");
    eprintln!("  --with-reference    Also write the indices and MF reference sheets");
    eprintln!("  --dry-run           Rank and print a summary without writing files");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "breakout_screen=info,screen_orchestrator=info,search_client=warn".into()
            }),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let mut config = ScreenConfig::from_env()?;
    if let Some(date) = flag_value(&args, "--date") {
        config.observation_date = date.to_string();
    }
    if let Some(dir) = flag_value(&args, "--output") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(n) = flag_value(&args, "--concurrency") {
        config.concurrency = n.parse().context("--concurrency must be an integer")?;
    }
    if args.iter().any(|a| a == "--with-reference") {
        config.include_reference_tables = true;
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {:#}", e);
        print_usage();
        std::process::exit(2);
    }

    tracing::info!(
        "Screening {} on {} ({} / {})",
        config.observation_date,
        config.store_endpoint,
        config.technical_index,
        config.fundamental_index
    );

    let include_reference = config.include_reference_tables;
    let output_dir = config.output_dir.clone();
    let pipeline = ScreenPipeline::from_config(config);
    let report = pipeline.run().await?;

    println!("=== Breakout screen ===");
    println!(
        "Observation date: {}",
        report.observation_date.as_deref().unwrap_or("(no matches)")
    );
    println!(
        "Matched: {} rows, {} tickers",
        report.matched.len(),
        report.matched_tickers()
    );
    println!(
        "Missed:  {} rows, {} tickers",
        report.missed.len(),
        report.missed_tickers()
    );
    for row in report.matched.iter().take(10) {
        println!(
            "  {:<14} score {:>3}  {}",
            row.ticker,
            row.net_score,
            row.fundamentals.as_str()
        );
    }

    if dry_run {
        println!("[DRY RUN] No files written.");
        return Ok(());
    }

    let mut sink = CsvDirectorySink::new(&output_dir);
    report
        .export(&mut sink, include_reference)
        .with_context(|| format!("writing tables to {}", output_dir.display()))?;
    println!("Tables written to {}", output_dir.display());

    Ok(())
}
