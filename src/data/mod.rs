pub mod synthetic;

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::PriceTable;

pub use synthetic::{default_profiles, SymbolProfile, SyntheticPriceGenerator};

/// Load a price table from a JSON file
pub fn load_prices(path: impl AsRef<Path>) -> Result<PriceTable> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read price file {}", path.display()))?;

    let table: PriceTable = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse price file {}", path.display()))?;

    tracing::info!(
        "Loaded {} price series from {}",
        table.series.len(),
        path.display()
    );
    Ok(table)
}

/// Write a price table as pretty-printed JSON
pub fn save_prices(path: impl AsRef<Path>, table: &PriceTable) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(table).context("Failed to serialize prices")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write price file {}", path.display()))?;
    Ok(())
}

/// Keep only the requested symbols, in the requested order.
///
/// Requested symbols missing from the table are logged and skipped. An
/// empty request keeps everything.
pub fn select_symbols(table: PriceTable, symbols: &[String]) -> PriceTable {
    if symbols.is_empty() {
        return table;
    }

    let mut remaining = table.series;
    let mut series = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match remaining.iter().position(|s| &s.symbol == symbol) {
            Some(pos) => series.push(remaining.swap_remove(pos)),
            None => tracing::warn!("No price series for {}", symbol),
        }
    }

    PriceTable { series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceSeries;
    use chrono::NaiveDate;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("lowcorr-{}-{}.json", name, std::process::id()))
    }

    fn table() -> PriceTable {
        let mut aapl = PriceSeries::new("AAPL");
        aapl.push(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), Some(185.6));
        aapl.push(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), None);
        PriceTable {
            series: vec![aapl, PriceSeries::new("NFLX"), PriceSeries::new("DX")],
        }
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        save_prices(&path, &table()).unwrap();

        let loaded = load_prices(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, table());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_prices(temp_path("does-not-exist")).unwrap_err();
        assert!(err.to_string().contains("Failed to read price file"));
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_path("invalid");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_prices(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(err.to_string().contains("Failed to parse price file"));
    }

    #[test]
    fn test_select_symbols() {
        let wanted = vec!["DX".to_string(), "GDO".to_string(), "AAPL".to_string()];
        let selected = select_symbols(table(), &wanted);
        assert_eq!(selected.symbols(), vec!["DX", "AAPL"]);

        let all = select_symbols(table(), &[]);
        assert_eq!(all.series.len(), 3);
    }
}
