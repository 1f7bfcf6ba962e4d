use crate::models::{PriceSeries, PriceTable};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How a synthetic symbol moves relative to the common market factor
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolProfile {
    pub symbol: String,
    /// Exposure to the market factor (0 = independent)
    pub beta: f64,
    /// Half-width of the idiosyncratic daily noise band
    pub noise: f64,
    /// Probability that a given day has no quote
    pub missing_rate: f64,
}

impl SymbolProfile {
    pub fn new(symbol: impl Into<String>, beta: f64, noise: f64) -> Self {
        Self {
            symbol: symbol.into(),
            beta,
            noise,
            missing_rate: 0.0,
        }
    }

    pub fn with_missing_rate(mut self, missing_rate: f64) -> Self {
        self.missing_rate = missing_rate;
        self
    }
}

/// Betas cycled over symbols by `default_profiles`: a mix of market
/// followers, independents and a hedge.
const DEFAULT_BETAS: &[f64] = &[1.2, 0.9, 0.0, 0.6, -0.4, 1.0, 0.2];

/// Assign each symbol a profile from a fixed beta cycle so some pairs are
/// strongly correlated and others barely.
pub fn default_profiles(symbols: &[String]) -> Vec<SymbolProfile> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, symbol)| SymbolProfile::new(symbol.clone(), DEFAULT_BETAS[i % DEFAULT_BETAS.len()], 0.01))
        .collect()
}

/// Generates synthetic daily closes from a one-factor model:
/// `return = beta * market + noise`.
pub struct SyntheticPriceGenerator {
    rng: StdRng,
    base_price: f64,
    /// Half-width of the daily market move band
    market_volatility: f64,
}

impl SyntheticPriceGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 100.0,
            market_volatility: 0.02,
        }
    }

    /// Generate `days` business days of closes starting at `start`
    /// (weekends are skipped).
    pub fn generate(&mut self, profiles: &[SymbolProfile], start: NaiveDate, days: usize) -> PriceTable {
        let dates = business_days(start, days);
        let mut series: Vec<PriceSeries> = profiles
            .iter()
            .map(|p| PriceSeries::new(p.symbol.clone()))
            .collect();
        let mut prices = vec![self.base_price; profiles.len()];

        for date in dates {
            let market = self.rng.gen_range(-self.market_volatility..self.market_volatility);

            for (i, profile) in profiles.iter().enumerate() {
                let noise = if profile.noise > 0.0 {
                    self.rng.gen_range(-profile.noise..profile.noise)
                } else {
                    0.0
                };
                // Keep prices positive on extreme draws
                let change = (profile.beta * market + noise).max(-0.5);
                prices[i] *= 1.0 + change;

                let missing = profile.missing_rate > 0.0 && self.rng.gen_bool(profile.missing_rate.min(1.0));
                series[i].push(date, if missing { None } else { Some(prices[i]) });
            }
        }

        PriceTable { series }
    }
}

/// First `count` weekdays on or after `start`
fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut date = start;
    while dates.len() < count {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date);
        }
        date += Duration::days(1);
    }
    dates
}
