use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{PriceSeries, PriceTable};

/// Half-open date window `[start, end)`, matching how daily history is
/// usually requested from market-data providers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Day-over-day percentage change.
///
/// The first entry is always `None`. An entry is also `None` when either
/// of the two prices it is derived from is missing or the previous price
/// is zero (no gap filling).
pub fn pct_change(prices: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut returns = Vec::with_capacity(prices.len());
    if prices.is_empty() {
        return returns;
    }

    returns.push(None);
    for window in prices.windows(2) {
        let change = match (window[0], window[1]) {
            (Some(prev), Some(curr)) if prev != 0.0 => Some((curr - prev) / prev),
            _ => None,
        };
        returns.push(change);
    }

    returns
}

/// Returns of several symbols aligned on a common set of dates.
///
/// Every column has exactly `dates.len()` observations and no gaps: dates
/// where any symbol lacks a return are removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnTable {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    columns: Vec<Vec<f64>>,
}

impl ReturnTable {
    /// Build aligned daily returns from raw prices.
    ///
    /// Symbols with no prices at all inside `range` are dropped. Returns
    /// are computed on the union of all dates, then every date with a
    /// missing return for any symbol is dropped.
    pub fn from_prices(table: &PriceTable, range: Option<DateRange>) -> Self {
        let mut seen = HashSet::new();
        let mut kept: Vec<PriceSeries> = Vec::new();

        for series in &table.series {
            if !seen.insert(series.symbol.clone()) {
                tracing::warn!("Duplicate series for {}, keeping the first", series.symbol);
                continue;
            }

            let mut filtered = PriceSeries::new(series.symbol.clone());
            for point in &series.points {
                if range.map_or(true, |r| r.contains(point.date)) {
                    filtered.push(point.date, point.close);
                }
            }

            if filtered.has_prices() {
                kept.push(filtered);
            } else {
                tracing::warn!("Dropping {}: no prices in requested range", series.symbol);
            }
        }

        let all_dates: Vec<NaiveDate> = kept
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let raw_returns: Vec<Vec<Option<f64>>> = kept
            .iter()
            .map(|series| {
                let by_date: HashMap<NaiveDate, Option<f64>> =
                    series.points.iter().map(|p| (p.date, p.close)).collect();
                let prices: Vec<Option<f64>> = all_dates
                    .iter()
                    .map(|d| by_date.get(d).copied().flatten())
                    .collect();
                pct_change(&prices)
            })
            .collect();

        let mut dates = Vec::new();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); kept.len()];

        for (row, date) in all_dates.iter().enumerate() {
            let complete: Option<Vec<f64>> = raw_returns.iter().map(|col| col[row]).collect();
            if let Some(values) = complete {
                dates.push(*date);
                for (column, value) in columns.iter_mut().zip(values) {
                    column.push(value);
                }
            }
        }

        let dropped = all_dates.len().saturating_sub(dates.len());
        tracing::debug!(
            "Aligned returns: {} symbols, {} dates kept, {} dropped",
            kept.len(),
            dates.len(),
            dropped
        );

        Self {
            symbols: kept.into_iter().map(|s| s.symbol).collect(),
            dates,
            columns,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    pub fn num_observations(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
