use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use lowcorr::config::DEFAULT_SYMBOLS;
use lowcorr::data::{self, SyntheticPriceGenerator};

/// Write a synthetic daily price file usable with `lowcorr --prices`
#[derive(Debug, Parser)]
#[command(name = "generate_prices", version, about)]
struct Args {
    /// Output JSON file
    #[arg(short, long, default_value = "prices.json")]
    output: PathBuf,

    /// Comma-separated symbols
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// First trading day (YYYY-MM-DD)
    #[arg(long, default_value = "2022-01-03")]
    start: NaiveDate,

    /// Number of business days
    #[arg(long, default_value_t = 500)]
    days: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Probability of a missing quote per symbol and day
    #[arg(long, default_value_t = 0.0)]
    missing_rate: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("lowcorr=info")
        .init();

    let args = Args::parse();
    if !(0.0..=1.0).contains(&args.missing_rate) {
        anyhow::bail!("missing_rate must be within [0, 1], got {}", args.missing_rate);
    }

    let symbols: Vec<String> = if args.symbols.is_empty() {
        DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
    } else {
        args.symbols.clone()
    };

    let profiles: Vec<_> = data::default_profiles(&symbols)
        .into_iter()
        .map(|p| p.with_missing_rate(args.missing_rate))
        .collect();

    let table = SyntheticPriceGenerator::new(args.seed).generate(&profiles, args.start, args.days);
    data::save_prices(&args.output, &table)?;

    println!(
        "✅ Wrote {} series x {} days to {}",
        table.series.len(),
        args.days,
        args.output.display()
    );
    for profile in &profiles {
        println!("   {:<8} beta {:+.2}", profile.symbol, profile.beta);
    }

    Ok(())
}
