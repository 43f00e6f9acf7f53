#![allow(dead_code)]

use chrono::NaiveDate;
use stockcalc::domain::dataset::{Dataset, PricePoint};
use stockcalc::domain::error::DataError;
use stockcalc::ports::price_source::{Interval, PriceSource};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_points(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _interval: Interval,
    ) -> Result<Vec<PricePoint>, DataError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(DataError::Malformed {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= start && p.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Three symbols over the first trading week of 2023, with gaps and one
/// dirty cell.
pub const WEEK_CSV: &str = "\
Date,Gold,Silver,CBA.AX
02-01-2023,\"$1,800.50\",23.10,100.00
03-01-2023,1810.00,,101.50
04-01-2023,1805.25,23.40,n/a
05-01-2023,,23.55,103.00
06-01-2023,1822.75,23.80,104.25
";

/// Prices for every day in the list, starting at `start` and rising by `step`.
pub fn series(start_date: &str, count: usize, start: f64, step: f64) -> Vec<PricePoint> {
    let first = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            PricePoint::new(
                first + chrono::Duration::days(i as i64),
                start + step * i as f64,
            )
        })
        .collect()
}

pub fn dataset(dates: &[NaiveDate], columns: &[(&str, &[Option<f64>])]) -> Dataset {
    Dataset::new(
        dates.to_vec(),
        columns
            .iter()
            .map(|(s, v)| (s.to_string(), v.to_vec()))
            .collect(),
    )
    .unwrap()
}

pub fn write_file(path: &Path, content: &str) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
