//! As-of price lookup.
//!
//! The price in effect on a date is the most recent non-missing value on or
//! before it. Lookup is a binary search over the sorted date index followed
//! by a backward scan past missing cells.

use crate::domain::dataset::Dataset;
use crate::domain::error::{CalcError, DataError, InputError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

/// Anything that can be reduced to a calendar day. Time of day is discarded.
pub trait TradingDay {
    fn trading_day(&self) -> NaiveDate;
}

impl TradingDay for NaiveDate {
    fn trading_day(&self) -> NaiveDate {
        *self
    }
}

impl TradingDay for NaiveDateTime {
    fn trading_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> TradingDay for DateTime<Tz> {
    fn trading_day(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// A resolved price and the date it was actually observed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPrice {
    pub price: f64,
    pub date: NaiveDate,
}

pub fn resolve_price<D: TradingDay>(
    dataset: &Dataset,
    symbol: &str,
    target: D,
) -> Result<ResolvedPrice, CalcError> {
    let values = dataset
        .column(symbol)
        .ok_or_else(|| InputError::UnknownSymbol {
            symbol: symbol.to_string(),
        })?;
    let target = target.trading_day();
    let dates = dataset.dates();

    // Index one past the last date <= target.
    let end = match dates.binary_search(&target) {
        Ok(idx) => {
            if let Some(price) = values[idx] {
                return Ok(ResolvedPrice {
                    price,
                    date: target,
                });
            }
            idx
        }
        Err(idx) => idx,
    };

    values[..end]
        .iter()
        .rposition(Option::is_some)
        .and_then(|idx| {
            values[idx].map(|price| ResolvedPrice {
                price,
                date: dates[idx],
            })
        })
        .ok_or_else(|| {
            DataError::NoPriceOnOrBefore {
                symbol: symbol.to_string(),
                date: target,
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(
            vec![
                d(2023, 1, 2),
                d(2023, 1, 3),
                d(2023, 1, 4),
                d(2023, 1, 6),
                d(2023, 1, 9),
            ],
            vec![
                ("Gold".into(), vec![None, Some(10.0), None, Some(12.0), Some(13.0)]),
                ("Empty".into(), vec![None, None, None, None, None]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn exact_match() {
        let r = resolve_price(&sample(), "Gold", d(2023, 1, 6)).unwrap();
        assert_eq!(r, ResolvedPrice { price: 12.0, date: d(2023, 1, 6) });
    }

    #[test]
    fn exact_date_with_missing_value_falls_back() {
        let r = resolve_price(&sample(), "Gold", d(2023, 1, 4)).unwrap();
        assert_eq!(r, ResolvedPrice { price: 10.0, date: d(2023, 1, 3) });
    }

    #[test]
    fn gap_date_falls_back() {
        let r = resolve_price(&sample(), "Gold", d(2023, 1, 5)).unwrap();
        assert_eq!(r, ResolvedPrice { price: 10.0, date: d(2023, 1, 3) });
        let r = resolve_price(&sample(), "Gold", d(2023, 1, 8)).unwrap();
        assert_eq!(r.date, d(2023, 1, 6));
    }

    #[test]
    fn after_last_date_uses_last_value() {
        let r = resolve_price(&sample(), "Gold", d(2024, 1, 1)).unwrap();
        assert_eq!(r, ResolvedPrice { price: 13.0, date: d(2023, 1, 9) });
    }

    #[test]
    fn before_first_value_is_data_error() {
        let err = resolve_price(&sample(), "Gold", d(2023, 1, 2)).unwrap_err();
        assert_eq!(
            err,
            CalcError::Data(DataError::NoPriceOnOrBefore {
                symbol: "Gold".into(),
                date: d(2023, 1, 2)
            })
        );
        let err = resolve_price(&sample(), "Gold", d(2020, 1, 1)).unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn all_missing_column_is_data_error() {
        let err = resolve_price(&sample(), "Empty", d(2023, 1, 9)).unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn unknown_symbol_is_input_error() {
        let err = resolve_price(&sample(), "Copper", d(2023, 1, 6)).unwrap_err();
        assert_eq!(
            err,
            CalcError::Input(InputError::UnknownSymbol {
                symbol: "Copper".into()
            })
        );
    }

    #[test]
    fn time_of_day_is_discarded() {
        let at = d(2023, 1, 6).and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        let r = resolve_price(&sample(), "Gold", at).unwrap();
        assert_eq!(r, ResolvedPrice { price: 12.0, date: d(2023, 1, 6) });

        let utc = at.and_utc();
        assert_eq!(utc.with_timezone(&Utc).trading_day(), d(2023, 1, 6));
    }

    proptest! {
        #[test]
        fn resolves_to_most_recent_present_value(
            cells in proptest::collection::vec(proptest::option::of(1.0f64..1000.0), 1..40),
            offset in 0i64..60,
        ) {
            let start = d(2022, 1, 1);
            let dates: Vec<NaiveDate> = (0..cells.len())
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect();
            let ds = Dataset::new(dates.clone(), vec![("S".into(), cells.clone())]).unwrap();
            let target = start + chrono::Duration::days(offset);

            let expected = dates
                .iter()
                .zip(&cells)
                .filter(|(day, v)| **day <= target && v.is_some())
                .last()
                .map(|(day, v)| (*day, v.unwrap()));

            match (resolve_price(&ds, "S", target), expected) {
                (Ok(r), Some((day, price))) => {
                    prop_assert_eq!(r.date, day);
                    prop_assert_eq!(r.price, price);
                }
                (Err(e), None) => prop_assert!(e.is_data()),
                (got, want) => prop_assert!(false, "got {:?}, want {:?}", got, want),
            }
        }
    }
}
