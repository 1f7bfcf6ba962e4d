use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily closing price for one symbol. `close` is `None` when the provider
/// had no quote for that date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Price history of a single ticker symbol, ordered by date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    pub fn push(&mut self, date: NaiveDate, close: Option<f64>) {
        self.points.push(PricePoint { date, close });
    }

    /// True if the series has at least one usable close
    pub fn has_prices(&self) -> bool {
        self.points.iter().any(|p| p.close.is_some())
    }
}

/// Collection of price series as supplied by the data-acquisition side
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceTable {
    pub series: Vec<PriceSeries>,
}

impl PriceTable {
    pub fn symbols(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_series_without_prices() {
        let mut series = PriceSeries::new("MEGI");
        series.push(date(2), None);
        series.push(date(3), None);

        assert!(!series.has_prices());

        series.push(date(4), Some(12.5));
        assert!(series.has_prices());
    }

    #[test]
    fn test_price_table_json_shape() {
        let json = r#"{
            "series": [
                { "symbol": "AAPL", "points": [
                    { "date": "2024-01-02", "close": 185.6 },
                    { "date": "2024-01-03", "close": null }
                ] }
            ]
        }"#;

        let table: PriceTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.symbols(), vec!["AAPL"]);
        assert_eq!(table.series[0].points[0].close, Some(185.6));
        assert_eq!(table.series[0].points[1].close, None);
        assert_eq!(table.series[0].points[1].date, date(3));
    }
}
