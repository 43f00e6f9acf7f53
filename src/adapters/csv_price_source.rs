//! Price source backed by a directory of per-symbol CSV files.
//!
//! Each `<symbol>.csv` holds an ISO `date` column and a `close` column
//! (any other columns are ignored). Weekly and monthly intervals keep the
//! last observation of each ISO week or calendar month.

use crate::domain::cleaning::clean_numeric;
use crate::domain::dataset::PricePoint;
use crate::domain::error::DataError;
use crate::ports::price_source::{Interval, PriceSource};
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::PathBuf;

const SOURCE_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvPriceSource {
    base_path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    /// Symbols with a file in the source directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, DataError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| DataError::Io {
            path: self.base_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::Io {
                path: self.base_path.display().to_string(),
                reason: e.to_string(),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

fn bucket(date: NaiveDate, interval: Interval) -> (i32, u32) {
    match interval {
        Interval::Daily => (date.year(), date.ordinal()),
        Interval::Weekly => {
            let week = date.iso_week();
            (week.year(), week.week())
        }
        Interval::Monthly => (date.year(), date.month()),
    }
}

/// Keep the last point of each interval bucket. Input must be sorted.
fn resample(points: Vec<PricePoint>, interval: Interval) -> Vec<PricePoint> {
    if interval == Interval::Daily {
        return points;
    }
    let mut out: Vec<PricePoint> = Vec::new();
    for point in points {
        match out.last_mut() {
            Some(last) if bucket(last.date, interval) == bucket(point.date, interval) => {
                *last = point;
            }
            _ => out.push(point),
        }
    }
    out
}

impl PriceSource for CsvPriceSource {
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PricePoint>, DataError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers()?.clone();
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let date_idx = find("date").ok_or_else(|| DataError::MissingDateColumn {
            column: "date".into(),
        })?;
        let close_idx = find("close").ok_or_else(|| DataError::Malformed {
            reason: format!("{} has no close column", path.display()),
        })?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let Some(date) = record
                .get(date_idx)
                .and_then(|c| NaiveDate::parse_from_str(c, SOURCE_DATE_FORMAT).ok())
            else {
                continue;
            };
            if date < start || date > end {
                continue;
            }
            if let Some(price) = record.get(close_idx).and_then(clean_numeric) {
                points.push(PricePoint::new(date, price));
            }
        }

        points.sort_by_key(|p| p.date);
        Ok(resample(points, interval))
    }
}
