//! Date-indexed price table.
//!
//! A [`Dataset`] is a sorted vector of distinct dates plus one aligned column
//! of optional prices per instrument symbol. Every constructor enforces the
//! invariants, so the rest of the crate can index columns by date position
//! without re-checking them.

use crate::domain::error::DataError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_DATE_COLUMN: &str = "Date";
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Shape of the tabular input/output: the date column name and the
/// `chrono` format used for its cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFormat {
    pub date_column: String,
    pub date_format: String,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// A single dated observation, as delivered by a price source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    symbol: String,
    values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset from already-aligned columns, validating every invariant.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, DataError> {
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DataError::Malformed {
                reason: format!("dates not strictly increasing at {} -> {}", pair[0], pair[1]),
            });
        }

        let mut seen = HashSet::new();
        let mut built = Vec::with_capacity(columns.len());
        for (symbol, values) in columns {
            if symbol.trim().is_empty() {
                return Err(DataError::Malformed {
                    reason: "empty symbol name".into(),
                });
            }
            if !seen.insert(symbol.clone()) {
                return Err(DataError::Malformed {
                    reason: format!("duplicate symbol {symbol}"),
                });
            }
            if values.len() != dates.len() {
                return Err(DataError::Malformed {
                    reason: format!(
                        "column {symbol} has {} values for {} dates",
                        values.len(),
                        dates.len()
                    ),
                });
            }
            if values.iter().flatten().any(|v| !v.is_finite()) {
                return Err(DataError::Malformed {
                    reason: format!("column {symbol} contains a non-finite value"),
                });
            }
            built.push(Column { symbol, values });
        }

        Ok(Self {
            dates,
            columns: built,
        })
    }

    /// Build a single-symbol dataset from a dated series in any order.
    /// Duplicate dates keep the later point; non-finite prices become missing.
    pub fn from_series(symbol: &str, points: &[PricePoint]) -> Result<Self, DataError> {
        if symbol.trim().is_empty() {
            return Err(DataError::Malformed {
                reason: "empty symbol name".into(),
            });
        }
        if points.is_empty() {
            return Err(DataError::EmptyFragment {
                reason: format!("no prices for {symbol}"),
            });
        }

        let mut rows = std::collections::BTreeMap::new();
        for point in points {
            rows.insert(point.date, Some(point.price).filter(|p| p.is_finite()));
        }

        let (dates, values): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        Ok(Self {
            dates,
            columns: vec![Column {
                symbol: symbol.to_string(),
                values,
            }],
        })
    }

    pub(crate) fn from_parts_unchecked(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Self {
        Self {
            dates,
            columns: columns
                .into_iter()
                .map(|(symbol, values)| Column { symbol, values })
                .collect(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Symbols in column order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.symbol.as_str())
    }

    pub fn symbol_count(&self) -> usize {
        self.columns.len()
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.columns.iter().any(|c| c.symbol == symbol)
    }

    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.symbol == symbol)
            .map(|c| c.values.as_slice())
    }

    /// Number of dated rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first_date()?, self.last_date()?))
    }

    /// Exact-date value; `None` if the date, the symbol, or the value is absent.
    pub fn value(&self, symbol: &str, date: NaiveDate) -> Option<f64> {
        let idx = self.dates.binary_search(&date).ok()?;
        self.column(symbol)?[idx]
    }

    pub fn missing_cells(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    /// Combine with a newer dataset. The date index becomes the union of both;
    /// a cell defined on both sides takes the newer value, otherwise whichever
    /// side defines it. Columns keep this dataset's order, new symbols follow.
    pub fn merge(&self, newer: &Dataset) -> Dataset {
        let dates: Vec<NaiveDate> = self
            .dates
            .iter()
            .chain(newer.dates.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let old_pos: Vec<Option<usize>> = dates
            .iter()
            .map(|d| self.dates.binary_search(d).ok())
            .collect();
        let new_pos: Vec<Option<usize>> = dates
            .iter()
            .map(|d| newer.dates.binary_search(d).ok())
            .collect();

        let mut order: Vec<&str> = self.symbols().collect();
        order.extend(newer.symbols().filter(|s| !self.has_symbol(s)));

        let columns = order
            .into_iter()
            .map(|symbol| {
                let old = self.column(symbol);
                let new = newer.column(symbol);
                let values = (0..dates.len())
                    .map(|i| {
                        let from_new = new.zip(new_pos[i]).and_then(|(col, p)| col[p]);
                        let from_old = old.zip(old_pos[i]).and_then(|(col, p)| col[p]);
                        from_new.or(from_old)
                    })
                    .collect();
                Column {
                    symbol: symbol.to_string(),
                    values,
                }
            })
            .collect();

        Dataset { dates, columns }
    }

    /// Copy without `symbol`. A row is pruned only when the removed column
    /// held its sole value; rows that were already empty stay in the index.
    pub fn without_symbol(&self, symbol: &str) -> Dataset {
        let removed = self.column(symbol);
        let columns: Vec<&Column> = self.columns.iter().filter(|c| c.symbol != symbol).collect();
        let keep: Vec<usize> = (0..self.dates.len())
            .filter(|&i| {
                removed.is_none_or(|col| col[i].is_none())
                    || columns.iter().any(|c| c.values[i].is_some())
            })
            .collect();

        Dataset {
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            columns: columns
                .into_iter()
                .map(|c| Column {
                    symbol: c.symbol.clone(),
                    values: keep.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }

    /// Single-symbol slice holding only the dates where `symbol` has a value.
    pub fn fragment_for(&self, symbol: &str) -> Option<Dataset> {
        let values = self.column(symbol)?;
        let (dates, kept): (Vec<_>, Vec<_>) = self
            .dates
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_some())
            .map(|(d, v)| (*d, *v))
            .unzip();
        Some(Dataset {
            dates,
            columns: vec![Column {
                symbol: symbol.to_string(),
                values: kept,
            }],
        })
    }

    /// Iterate `(date, values)` rows with values in the requested column order.
    /// Unknown symbols yield missing cells.
    pub fn rows<'a>(
        &'a self,
        order: &'a [String],
    ) -> impl Iterator<Item = (NaiveDate, Vec<Option<f64>>)> + 'a {
        let cols: Vec<Option<&[Option<f64>]>> = order.iter().map(|s| self.column(s)).collect();
        self.dates.iter().enumerate().map(move |(i, date)| {
            let values = cols.iter().map(|c| c.and_then(|col| col[i])).collect();
            (*date, values)
        })
    }
}
