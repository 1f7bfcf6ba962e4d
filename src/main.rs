use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lowcorr::data::{self, SyntheticPriceGenerator};
use lowcorr::models::PriceTable;
use lowcorr::report::{self, GroupReport};
use lowcorr::selection::{rng_from_seed, GroupSelector};
use lowcorr::stats::{correlation_matrix, ReturnTable};
use lowcorr::AppConfig;

/// Seed for synthetic prices when no seed is configured
const SYNTHETIC_SEED: u64 = 42;

/// Find the least mutually correlated group of ticker symbols
#[derive(Debug, Parser)]
#[command(name = "lowcorr", version, about)]
struct Cli {
    /// Config file (defaults to ./lowcorr.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON price file
    #[arg(short, long, conflicts_with = "synthetic")]
    prices: Option<PathBuf>,

    /// Use generated prices for the configured symbols
    #[arg(long)]
    synthetic: bool,

    /// Business days of synthetic history
    #[arg(long, default_value_t = 500)]
    days: usize,

    /// Number of symbols in the group (defaults to all symbols)
    #[arg(short, long)]
    group_size: Option<usize>,

    /// Number of random groups to evaluate
    #[arg(short, long)]
    trials: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate trials on all cores
    #[arg(long)]
    parallel: bool,

    /// Print the search result as JSON after the report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing::info!(
        "Analysing {} symbols from {} to {}",
        config.symbols.len(),
        config.start_date,
        config.end_date
    );

    let prices = load_price_table(&cli, &config)?;
    let prices = data::select_symbols(prices, &config.symbols);

    let returns = ReturnTable::from_prices(&prices, Some(config.date_range()));
    let matrix = correlation_matrix(&returns).context("Failed to build correlation matrix")?;

    print!("{}", report::render_symbols(&matrix));
    print!("{}", report::render_matrix(&matrix));
    print!("{}", report::render_pairwise(&matrix));

    let selector = GroupSelector::new(config.trials).with_parallel(config.parallel);
    let mut rng = rng_from_seed(config.seed);

    let result = match selector.select(&matrix, config.group_size(), &mut rng) {
        Ok(result) => result,
        Err(e) => {
            println!("\n❌ Error: Could not find valid group of symbols ({})", e);
            return Err(e.into());
        }
    };

    GroupReport::build(&result, &matrix).print();

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        );
    }

    Ok(())
}

// ============================================================================
// Initialization Functions
// ============================================================================

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lowcorr=info")),
        )
        .init();
}

/// Config file and environment, then command-line overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    if let Some(group_size) = cli.group_size {
        config.group_size = Some(group_size);
    }
    if let Some(trials) = cli.trials {
        config.trials = trials;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.parallel {
        config.parallel = true;
    }
    if cli.prices.is_some() {
        config.prices_file = cli.prices.clone();
    }

    Ok(config)
}

fn load_price_table(cli: &Cli, config: &AppConfig) -> Result<PriceTable> {
    if cli.synthetic {
        let seed = config.seed.unwrap_or(SYNTHETIC_SEED);
        tracing::info!(
            "Generating {} days of synthetic prices (seed {})",
            cli.days,
            seed
        );
        let profiles = data::default_profiles(&config.symbols);
        return Ok(SyntheticPriceGenerator::new(seed).generate(&profiles, config.start_date, cli.days));
    }

    match &config.prices_file {
        Some(path) => data::load_prices(path),
        None => anyhow::bail!("No price source: pass --prices <FILE>, set prices_file, or use --synthetic"),
    }
}
