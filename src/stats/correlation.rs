use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use super::returns::ReturnTable;

const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatrixError {
    #[error("Matrix is not square: {symbols} symbols but row {row} has {len} values")]
    NotSquare { symbols: usize, row: usize, len: usize },

    #[error("Matrix has {rows} rows for {symbols} symbols")]
    RowCount { symbols: usize, rows: usize },

    #[error("Upper triangle for {symbols} symbols needs {expected} values, got {len}")]
    TriangleLength { symbols: usize, expected: usize, len: usize },

    #[error("Duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("Asymmetric entries for {a}/{b}: {ab} vs {ba}")]
    Asymmetric { a: String, b: String, ab: f64, ba: f64 },

    #[error("Diagonal entry for {symbol} is {value}, expected 1.0")]
    BadDiagonal { symbol: String, value: f64 },

    #[error("Correlation {a}/{b} = {value} is outside [-1, 1]")]
    OutOfRange { a: String, b: String, value: f64 },

    #[error("Not enough observations: {found} aligned returns, need at least {required}")]
    NotEnoughObservations { found: usize, required: usize },

    #[error("Returns of {0} have zero variance")]
    ZeroVariance(String),
}

/// Square symmetric matrix of pairwise correlations with 1.0 on the diagonal.
///
/// Invariants are checked once at construction, after which the matrix is
/// read-only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    // Row-major, symbols.len() squared
    values: Vec<f64>,
}

impl CorrelationMatrix {
    pub fn new(symbols: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let n = symbols.len();
        if rows.len() != n {
            return Err(MatrixError::RowCount {
                symbols: n,
                rows: rows.len(),
            });
        }
        if let Some((row, values)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(MatrixError::NotSquare {
                symbols: n,
                row,
                len: values.len(),
            });
        }

        let mut seen = HashSet::new();
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(MatrixError::DuplicateSymbol(symbol.clone()));
            }
        }

        for i in 0..n {
            let diagonal = rows[i][i];
            if (diagonal - 1.0).abs() > TOLERANCE || diagonal.is_nan() {
                return Err(MatrixError::BadDiagonal {
                    symbol: symbols[i].clone(),
                    value: diagonal,
                });
            }

            for j in (i + 1)..n {
                let (ab, ba) = (rows[i][j], rows[j][i]);
                for value in [ab, ba] {
                    // NaN fails this check as well
                    if !(-1.0..=1.0).contains(&value) {
                        return Err(MatrixError::OutOfRange {
                            a: symbols[i].clone(),
                            b: symbols[j].clone(),
                            value,
                        });
                    }
                }
                if (ab - ba).abs() > TOLERANCE {
                    return Err(MatrixError::Asymmetric {
                        a: symbols[i].clone(),
                        b: symbols[j].clone(),
                        ab,
                        ba,
                    });
                }
            }
        }

        Ok(Self {
            symbols,
            values: rows.into_iter().flatten().collect(),
        })
    }

    /// Build from the strict upper triangle, given row by row
    /// (`(0,1), (0,2), ..., (1,2), ...`).
    pub fn from_upper_triangle(symbols: Vec<String>, upper: &[f64]) -> Result<Self, MatrixError> {
        let n = symbols.len();
        let expected = n * n.saturating_sub(1) / 2;
        if upper.len() != expected {
            return Err(MatrixError::TriangleLength {
                symbols: n,
                expected,
                len: upper.len(),
            });
        }

        let mut rows = vec![vec![0.0; n]; n];
        let mut k = 0;
        for i in 0..n {
            rows[i][i] = 1.0;
            for j in (i + 1)..n {
                rows[i][j] = upper[k];
                rows[j][i] = upper[k];
                k += 1;
            }
        }

        Self::new(symbols, rows)
    }

    pub fn empty() -> Self {
        Self {
            symbols: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Correlation between the symbols at indices `i` and `j`.
    ///
    /// Only the upper triangle is ever read.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (row, col) = if i <= j { (i, j) } else { (j, i) };
        self.values[row * self.symbols.len() + col]
    }

    pub fn get_by_symbol(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.get(self.index_of(a)?, self.index_of(b)?))
    }

    /// All unordered pairs in column order with their correlation
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        let n = self.symbols.len();
        (0..n).flat_map(move |i| {
            ((i + 1)..n).map(move |j| (self.symbols[i].as_str(), self.symbols[j].as_str(), self.get(i, j)))
        })
    }

    /// Mean absolute correlation over every off-diagonal pair, `None` for
    /// fewer than two symbols.
    pub fn mean_abs_off_diagonal(&self) -> Option<f64> {
        let n = self.symbols.len();
        if n < 2 {
            return None;
        }
        let sum: f64 = self.pairs().map(|(_, _, c)| c.abs()).sum();
        Some(sum / (n * (n - 1) / 2) as f64)
    }
}

/// Pearson correlation coefficient of two equally long samples.
///
/// `None` if the lengths differ, there are fewer than two observations, or
/// either sample has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || !has_variance(a) || !has_variance(b) {
        return None;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }

    // Rounding can push |r| a hair past 1
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

/// Exact comparison, a constant series can still leave rounding noise
/// around its computed mean
fn has_variance(values: &[f64]) -> bool {
    values.windows(2).any(|w| w[0] != w[1])
}

/// Pairwise Pearson correlation of every column in the return table.
///
/// Symbols whose returns have zero variance are dropped with a warning;
/// [`MatrixError::ZeroVariance`] is returned only when fewer than two
/// symbols survive that step.
pub fn correlation_matrix(returns: &ReturnTable) -> Result<CorrelationMatrix, MatrixError> {
    let symbols = returns.symbols().to_vec();
    let n = symbols.len();
    if n == 0 {
        return Ok(CorrelationMatrix::empty());
    }

    let found = returns.num_observations();
    if found < 2 {
        return Err(MatrixError::NotEnoughObservations { found, required: 2 });
    }

    // Flat return series have no defined correlation: drop them like
    // symbols without prices
    let mut kept = Vec::with_capacity(n);
    let mut flat = Vec::new();
    for (i, symbol) in symbols.iter().enumerate() {
        if has_variance(returns.column(i)) {
            kept.push(i);
        } else {
            tracing::warn!("Dropping {}: returns have zero variance", symbol);
            flat.push(symbol.clone());
        }
    }

    if let Some(first) = flat.into_iter().next() {
        if kept.len() < 2 {
            return Err(MatrixError::ZeroVariance(first));
        }
    }

    let mut upper = Vec::with_capacity(kept.len() * (kept.len() - 1) / 2);
    for (pos, &i) in kept.iter().enumerate() {
        for &j in &kept[pos + 1..] {
            let corr = pearson(returns.column(i), returns.column(j))
                .ok_or_else(|| MatrixError::ZeroVariance(symbols[j].clone()))?;
            upper.push(corr);
        }
    }

    let symbols = kept.iter().map(|&i| symbols[i].clone()).collect();
    CorrelationMatrix::from_upper_triangle(symbols, &upper)
}
