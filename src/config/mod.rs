use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::selection::selector::DEFAULT_TRIALS;
use crate::stats::DateRange;

/// Symbols analysed when no list is configured
pub const DEFAULT_SYMBOLS: &[&str] = &["GDO", "DX", "MEGI", "SLVO", "NFLX", "AAPL", "GOOGL"];

/// Prefix for environment overrides (`LOWCORR_TRIALS`, `LOWCORR_SYMBOLS`, ...)
pub const ENV_PREFIX: &str = "LOWCORR";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_NAME: &str = "lowcorr";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Defaults to the number of symbols
    pub group_size: Option<usize>,
    pub trials: usize,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
    pub parallel: bool,
    pub prices_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default(),
            group_size: None,
            trials: DEFAULT_TRIALS,
            seed: None,
            parallel: false,
            prices_file: None,
        }
    }
}

impl AppConfig {
    /// Merge defaults, the config file and `LOWCORR_*` environment variables.
    ///
    /// With `path = None` an optional `lowcorr.{toml,json,...}` in the
    /// working directory is used; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => ::config::File::from(p.to_path_buf()).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("symbols"),
            )
            .build()
            .context("Failed to load configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;

        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_date >= self.end_date {
            anyhow::bail!(
                "start_date ({}) must be before end_date ({})",
                self.start_date,
                self.end_date
            );
        }
        if let Some(symbol) = self.symbols.iter().find(|s| s.trim().is_empty()) {
            anyhow::bail!("Empty symbol in symbol list: {:?}", symbol);
        }
        Ok(())
    }

    /// Requested group size, all configured symbols by default
    pub fn group_size(&self) -> usize {
        self.group_size.unwrap_or(self.symbols.len())
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("lowcorr-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.symbols.len(), 7);
        assert_eq!(config.group_size(), 7);
        assert_eq!(config.trials, 1000);
        assert!(config.validate().is_ok());
        assert!(config
            .date_range()
            .contains(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
    }

    #[test]
    fn test_load_from_file() {
        let path = write_temp(
            "load",
            r#"
symbols = ["AAPL", "NFLX", "GOOGL"]
start_date = "2023-01-01"
end_date = "2024-01-01"
group_size = 2
trials = 250
seed = 9
parallel = true
"#,
        );

        let config = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.symbols, vec!["AAPL", "NFLX", "GOOGL"]);
        assert_eq!(config.group_size(), 2);
        assert_eq!(config.trials, 250);
        assert_eq!(config.seed, Some(9));
        assert!(config.parallel);
        assert_eq!(config.prices_file, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = write_temp("partial", "trials = 10\n");

        let config = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.trials, 10);
        assert_eq!(config.symbols, AppConfig::default().symbols);
    }

    #[test]
    fn test_rejects_inverted_dates() {
        let path = write_temp(
            "dates",
            "start_date = \"2025-01-01\"\nend_date = \"2024-01-01\"\n",
        );

        let err = AppConfig::load(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(err.to_string().contains("must be before"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let path = std::env::temp_dir().join("lowcorr-no-such-config.toml");
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}
