//! External price-fetch port.
//!
//! Implementations may be slow (network, disk); they run outside the store
//! and hand a finished fragment to
//! [`DatasetStore::merge`](crate::domain::store::DatasetStore::merge).

use crate::domain::dataset::{Dataset, PricePoint};
use crate::domain::error::DataError;
use chrono::NaiveDate;
use log::warn;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "daily" => Ok(Interval::Daily),
            "1wk" | "weekly" => Ok(Interval::Weekly),
            "1mo" | "monthly" => Ok(Interval::Monthly),
            other => Err(format!("unknown interval '{other}' (expected 1d, 1wk or 1mo)")),
        }
    }
}

pub trait PriceSource {
    /// Dated prices for `symbol` between `start` and `end` inclusive.
    /// An empty vector means the source has nothing for the range.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Vec<PricePoint>, DataError>;

    /// Fetch several symbols and join them by date into one fragment.
    /// Symbols that fail or come back empty are skipped; the call fails only
    /// when no symbol produced data.
    fn fetch_many(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<Dataset, DataError> {
        let mut joined: Option<Dataset> = None;

        for symbol in symbols {
            let points = match self.fetch(symbol, start, end, interval) {
                Ok(points) if points.is_empty() => {
                    warn!("no data for {symbol} between {start} and {end}");
                    continue;
                }
                Ok(points) => points,
                Err(e) => {
                    warn!("skipping {symbol}: {e}");
                    continue;
                }
            };
            let series = Dataset::from_series(symbol, &points)?;
            joined = Some(match joined {
                Some(acc) => acc.merge(&series),
                None => series,
            });
        }

        joined.ok_or_else(|| DataError::EmptyFragment {
            reason: format!("no data fetched for any of {} symbols", symbols.len()),
        })
    }
}
