//! KlineVault CLI: download and verify commands.
//!
//! Commands:
//! - `download`: fetch monthly kline archives, merge them into one CSV
//!   per symbol/period, and audit the result
//! - `verify`: audit existing merged series without touching the network

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use klinevault_core::{
    download_range, merge_archives, read_series, verify_series, write_series, DownloaderConfig,
    Fetcher, Period, StdoutProgress,
};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(
    name = "klinevault",
    about = "Historical kline archive downloader"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download monthly kline archives, merge them, and verify integrity.
    Download {
        /// Symbols to download (e.g., BTCUSDT ETHUSDT).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Periods to download (e.g., 1m 5m 1h).
        #[arg(long, num_args = 1.., default_value = "1m")]
        periods: Vec<String>,

        /// Start date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Optional TOML config file; --data-dir still wins.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Audit existing merged series without downloading.
    Verify {
        /// Symbols to verify.
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Periods to verify.
        #[arg(long, num_args = 1.., default_value = "1m")]
        periods: Vec<String>,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Download {
            symbols,
            periods,
            start,
            end,
            data_dir,
            config,
        } => run_download(symbols, periods, start, end, data_dir, config),
        Commands::Verify {
            symbols,
            periods,
            data_dir,
        } => run_verify(symbols, periods, data_dir),
    }
}

fn parse_periods(periods: &[String]) -> Result<Vec<Period>> {
    periods
        .iter()
        .map(|p| Period::from_str(p).map_err(anyhow::Error::from))
        .collect()
}

fn run_download(
    symbols: Vec<String>,
    periods: Vec<String>,
    start: String,
    end: Option<String>,
    data_dir: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => DownloaderConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DownloaderConfig::default(),
    };
    config.data_dir = data_dir;

    let start_date = NaiveDate::parse_from_str(&start, "%Y-%m-%d")?;
    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let periods = parse_periods(&periods)?;
    let fetcher = Fetcher::new(&config);
    let progress = StdoutProgress;

    let mut failures = 0;
    for symbol in &symbols {
        for &period in &periods {
            println!("\n=== {symbol} {period} ===");
            match process_pair(&fetcher, &config, symbol, period, start_date, end_date, &progress) {
                Ok(true) => println!("Data integrity check passed for {symbol}-{period}"),
                Ok(false) => println!("Data integrity check failed for {symbol}-{period}"),
                Err(e) => {
                    eprintln!("Error processing {symbol}-{period}: {e}");
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Fetch, merge, persist, and audit one (symbol, period) pair. Returns
/// the integrity verdict; hard errors bubble up to be reported per pair.
fn process_pair(
    fetcher: &Fetcher,
    config: &DownloaderConfig,
    symbol: &str,
    period: Period,
    start: NaiveDate,
    end: NaiveDate,
    progress: &StdoutProgress,
) -> Result<bool> {
    let summary = download_range(fetcher, symbol, period, start, end, progress)?;
    if !summary.all_succeeded() {
        println!(
            "{} of {} archives failed to download (re-run to retry)",
            summary.failed, summary.total
        );
    }

    let series = merge_archives(config, symbol, period)?;
    let path = write_series(config, &series)?;
    println!("Merged {} rows into {}", series.len(), path.display());

    Ok(verify_series(&series, period))
}

fn run_verify(symbols: Vec<String>, periods: Vec<String>, data_dir: PathBuf) -> Result<()> {
    let config = DownloaderConfig {
        data_dir,
        ..Default::default()
    };
    let periods = parse_periods(&periods)?;

    let mut failures = 0;
    for symbol in &symbols {
        for &period in &periods {
            match read_series(&config, symbol, period) {
                Ok(series) => {
                    if verify_series(&series, period) {
                        println!("OK: {symbol}-{period} ({} rows)", series.len());
                    } else {
                        println!("INCOMPLETE: {symbol}-{period} ({} rows)", series.len());
                        failures += 1;
                    }
                }
                Err(e) => {
                    eprintln!("FAIL: {symbol}-{period}: {e}");
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
