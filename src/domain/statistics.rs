//! Dataset summary figures.

use crate::domain::dataset::Dataset;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolCoverage {
    pub symbol: String,
    /// Number of dates with a price.
    pub present: usize,
    pub first: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
}

impl SymbolCoverage {
    /// Share of the date index that has a price, as a percentage.
    pub fn coverage_pct(&self, rows: usize) -> f64 {
        if rows == 0 {
            0.0
        } else {
            self.present as f64 / rows as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetStatistics {
    pub rows: usize,
    pub symbols: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub missing_cells: usize,
    pub coverage: Vec<SymbolCoverage>,
}

impl DatasetStatistics {
    pub fn compute(dataset: Option<&Dataset>) -> Self {
        let Some(dataset) = dataset else {
            return Self::default();
        };

        let dates = dataset.dates();
        let coverage = dataset
            .symbols()
            .filter_map(|symbol| {
                let values = dataset.column(symbol)?;
                let present: Vec<NaiveDate> = dates
                    .iter()
                    .zip(values)
                    .filter(|(_, v)| v.is_some())
                    .map(|(d, _)| *d)
                    .collect();
                Some(SymbolCoverage {
                    symbol: symbol.to_string(),
                    present: present.len(),
                    first: present.first().copied(),
                    last: present.last().copied(),
                })
            })
            .collect();

        Self {
            rows: dataset.len(),
            symbols: dataset.symbol_count(),
            date_range: dataset.date_range(),
            missing_cells: dataset.missing_cells(),
            coverage,
        }
    }
}
