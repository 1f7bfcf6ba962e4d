use std::fmt;

use serde::Serialize;

use crate::selection::SearchResult;
use crate::stats::CorrelationMatrix;

/// Average absolute correlation of one group member with the others
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SymbolCorrelation {
    pub symbol: String,
    pub avg_abs_correlation: f64,
}

/// Per-symbol breakdown of a search result, derived from the same matrix
/// the search ran on.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupReport {
    pub rows: Vec<SymbolCorrelation>,
    pub group_average: f64,
    pub requested_size: usize,
    pub effective_size: usize,
    pub clamped: bool,
    pub trials: usize,
    pub best_trial: usize,
}

impl GroupReport {
    pub fn build(result: &SearchResult, matrix: &CorrelationMatrix) -> Self {
        let rows = result
            .indices
            .iter()
            .zip(&result.group)
            .map(|(&i, symbol)| {
                let others: Vec<f64> = result
                    .indices
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| matrix.get(i, j).abs())
                    .collect();
                let avg = if others.is_empty() {
                    0.0
                } else {
                    others.iter().sum::<f64>() / others.len() as f64
                };
                SymbolCorrelation {
                    symbol: symbol.clone(),
                    avg_abs_correlation: avg,
                }
            })
            .collect();

        Self {
            rows,
            group_average: result.score,
            requested_size: result.requested_size,
            effective_size: result.effective_size,
            clamped: result.clamped,
            trials: result.trials,
            best_trial: result.best_trial,
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn print(&self) {
        print!("{}", self);
    }
}

impl fmt::Display for GroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n🎯 LEAST CORRELATED GROUP")?;
        writeln!(f, "{}", "─".repeat(40))?;
        writeln!(f, "{:<8}|  {}", "Symbol", "Avg Correlation")?;
        writeln!(f, "{}", "─".repeat(40))?;
        for row in &self.rows {
            writeln!(f, "{:<8}|  {:.4}", row.symbol, row.avg_abs_correlation)?;
        }
        writeln!(f, "{}", "─".repeat(40))?;
        writeln!(
            f,
            "Group's average absolute correlation: {:.4}",
            self.group_average
        )?;
        writeln!(
            f,
            "Group size: {} (requested {})",
            self.effective_size, self.requested_size
        )?;
        if self.clamped {
            writeln!(
                f,
                "⚠️  Only {} valid symbols were available, group size was reduced",
                self.effective_size
            )?;
        }
        writeln!(f, "Found at trial {} of {}", self.best_trial + 1, self.trials)
    }
}

pub fn render_symbols(matrix: &CorrelationMatrix) -> String {
    format!(
        "\nValid symbols after cleaning: {}\nSymbols: {}\n",
        matrix.len(),
        matrix.symbols().join(", ")
    )
}

/// Full matrix, three decimals
pub fn render_matrix(matrix: &CorrelationMatrix) -> String {
    let width = matrix
        .symbols()
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(0)
        .max(6);
    let rule = "─".repeat(60);

    let header: String = matrix
        .symbols()
        .iter()
        .map(|symbol| format!(" {:>width$}", symbol, width = width))
        .collect();

    let mut lines = vec![
        "\n📊 CORRELATION MATRIX".to_string(),
        rule.clone(),
        format!("{:<width$}{}", "", header, width = width),
    ];
    for (i, symbol) in matrix.symbols().iter().enumerate() {
        let values: String = (0..matrix.len())
            .map(|j| format!(" {:>width$.3}", matrix.get(i, j), width = width))
            .collect();
        lines.push(format!("{:<width$}{}", symbol, values, width = width));
    }
    lines.push(rule);

    lines.join("\n") + "\n"
}

pub fn render_pairwise(matrix: &CorrelationMatrix) -> String {
    let mut lines = vec!["\nPairwise Correlations:".to_string()];
    lines.extend(
        matrix
            .pairs()
            .map(|(a, b, corr)| format!("{} <-> {}: {:.3}", a, b, corr)),
    );
    lines.push("─".repeat(60));

    lines.join("\n") + "\n"
}
