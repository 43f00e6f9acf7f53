//! Tabular ingestion: raw CSV text to a cleaned [`Dataset`].

use crate::domain::cleaning::clean_numeric;
use crate::domain::dataset::{Dataset, TableFormat};
use crate::domain::error::DataError;
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};
use std::io::Read;

pub fn parse_csv_str(text: &str, format: &TableFormat) -> Result<Dataset, DataError> {
    from_reader(text.as_bytes(), format)
}

/// Parse a CSV stream. Rows with an unparseable date are dropped; duplicate
/// dates keep the later row; price cells go through [`clean_numeric`].
pub fn from_reader<R: Read>(reader: R, format: &TableFormat) -> Result<Dataset, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == format.date_column)
        .ok_or_else(|| DataError::MissingDateColumn {
            column: format.date_column.clone(),
        })?;

    let mut seen = HashSet::new();
    let mut symbols: Vec<(usize, String)> = Vec::with_capacity(headers.len().saturating_sub(1));
    for (idx, header) in headers.iter().enumerate() {
        if idx == date_idx {
            continue;
        }
        if header == format.date_column {
            return Err(DataError::InvalidHeader {
                position: idx,
                reason: format!("date column {header} repeated"),
            });
        }
        if header.is_empty() {
            return Err(DataError::InvalidHeader {
                position: idx,
                reason: "empty symbol name".into(),
            });
        }
        if !seen.insert(header) {
            return Err(DataError::InvalidHeader {
                position: idx,
                reason: format!("duplicate symbol {header}"),
            });
        }
        symbols.push((idx, header.to_string()));
    }

    let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let mut dropped = 0usize;
    let mut duplicates = 0usize;

    for record in rdr.byte_records() {
        let record = record?;
        let date = text_cell(&record, date_idx)
            .and_then(|cell| NaiveDate::parse_from_str(cell.trim(), &format.date_format).ok());
        let Some(date) = date else {
            dropped += 1;
            continue;
        };

        let values = symbols
            .iter()
            .map(|(idx, _)| text_cell(&record, *idx).and_then(clean_numeric))
            .collect();
        if rows.insert(date, values).is_some() {
            duplicates += 1;
        }
    }

    if dropped > 0 {
        warn!(
            "dropped {} rows with a date not matching {}",
            dropped, format.date_format
        );
    }
    if duplicates > 0 {
        debug!("{} duplicate dates resolved to the later row", duplicates);
    }

    if rows.is_empty() {
        return Err(DataError::NoRows {
            format: format.date_format.clone(),
        });
    }

    let dates: Vec<NaiveDate> = rows.keys().copied().collect();
    let mut columns: Vec<(String, Vec<Option<f64>>)> = symbols
        .into_iter()
        .map(|(_, symbol)| (symbol, Vec::with_capacity(dates.len())))
        .collect();
    for values in rows.into_values() {
        for (column, value) in columns.iter_mut().zip(values) {
            column.1.push(value);
        }
    }

    if !columns
        .iter()
        .any(|(_, values)| values.iter().any(Option::is_some))
    {
        return Err(DataError::NoNumericValues);
    }

    Ok(Dataset::from_parts_unchecked(dates, columns))
}

/// A cell that is not valid UTF-8 reads as absent.
fn text_cell(record: &csv::ByteRecord, idx: usize) -> Option<&str> {
    record.get(idx).and_then(|raw| std::str::from_utf8(raw).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn parse(text: &str) -> Result<Dataset, DataError> {
        parse_csv_str(text, &TableFormat::default())
    }

    #[test]
    fn parses_basic_table() {
        let ds = parse("Date,Gold,Silver\n02-01-2023,1800.5,23.1\n03-01-2023,1810,23.4\n").unwrap();
        assert_eq!(ds.dates(), &[d(2023, 1, 2), d(2023, 1, 3)]);
        assert_eq!(ds.symbols().collect::<Vec<_>>(), vec!["Gold", "Silver"]);
        assert_eq!(ds.value("Gold", d(2023, 1, 3)), Some(1810.0));
    }

    #[test]
    fn cleans_quoted_thousands() {
        let ds = parse("Date,Index\n02-01-2023,\"1,234.50\"\n").unwrap();
        assert_eq!(ds.value("Index", d(2023, 1, 2)), Some(1234.50));
    }

    #[test]
    fn empty_and_garbage_cells_are_missing() {
        let ds = parse("Date,A,B\n02-01-2023,,x\n03-01-2023,5,6\n").unwrap();
        assert_eq!(ds.column("A").unwrap(), &[None, Some(5.0)]);
        assert_eq!(ds.column("B").unwrap(), &[None, Some(6.0)]);
    }

    #[test]
    fn short_rows_fill_missing() {
        let ds = parse("Date,A,B\n02-01-2023,1\n").unwrap();
        assert_eq!(ds.column("B").unwrap(), &[None]);
    }

    #[test]
    fn unparseable_dates_drop_whole_row() {
        let ds = parse("Date,A\nnot-a-date,1\n2023-01-02,2\n03-01-2023,3\n").unwrap();
        assert_eq!(ds.dates(), &[d(2023, 1, 3)]);
        assert_eq!(ds.column("A").unwrap(), &[Some(3.0)]);
    }

    #[test]
    fn sorts_rows_ascending() {
        let ds = parse("Date,A\n05-01-2023,5\n02-01-2023,2\n03-01-2023,3\n").unwrap();
        assert_eq!(ds.dates(), &[d(2023, 1, 2), d(2023, 1, 3), d(2023, 1, 5)]);
        assert_eq!(ds.column("A").unwrap(), &[Some(2.0), Some(3.0), Some(5.0)]);
    }

    #[test]
    fn duplicate_dates_keep_later_row() {
        let ds = parse("Date,A\n02-01-2023,1\n02-01-2023,9\n").unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.value("A", d(2023, 1, 2)), Some(9.0));
    }

    #[test]
    fn date_column_may_be_anywhere() {
        let ds = parse("A,Date\n7,02-01-2023\n").unwrap();
        assert_eq!(ds.symbols().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(ds.value("A", d(2023, 1, 2)), Some(7.0));
    }

    #[test]
    fn custom_format() {
        let format = TableFormat {
            date_column: "day".into(),
            date_format: "%Y-%m-%d".into(),
        };
        let ds = parse_csv_str("day,A\n2023-01-02,1\n", &format).unwrap();
        assert_eq!(ds.first_date(), Some(d(2023, 1, 2)));
    }

    #[test]
    fn missing_date_column_fails() {
        let err = parse("When,A\n02-01-2023,1\n").unwrap_err();
        assert_eq!(
            err,
            DataError::MissingDateColumn {
                column: "Date".into()
            }
        );
    }

    #[test]
    fn no_parseable_rows_fails() {
        let err = parse("Date,A\nbad,1\n").unwrap_err();
        assert!(matches!(err, DataError::NoRows { .. }));
        let err = parse("Date,A\n").unwrap_err();
        assert!(matches!(err, DataError::NoRows { .. }));
    }

    #[test]
    fn no_numeric_values_fails() {
        let err = parse("Date,A,B\n02-01-2023,,n/a\n").unwrap_err();
        assert_eq!(err, DataError::NoNumericValues);
        let err = parse("Date\n02-01-2023\n").unwrap_err();
        assert_eq!(err, DataError::NoNumericValues);
    }

    #[test]
    fn duplicate_header_fails() {
        let err = parse("Date,A,A\n02-01-2023,1,2\n").unwrap_err();
        assert!(matches!(err, DataError::InvalidHeader { position: 2, .. }));
    }

    #[test]
    fn empty_header_fails() {
        let err = parse("Date,,A\n02-01-2023,1,2\n").unwrap_err();
        assert!(matches!(err, DataError::InvalidHeader { position: 1, .. }));
    }

    #[test]
    fn repeated_date_header_fails() {
        let err = parse("Date,Gold,Date\n02-01-2023,1,03-01-2023\n").unwrap_err();
        assert!(matches!(err, DataError::InvalidHeader { position: 2, .. }));
    }

    #[test]
    fn invalid_utf8_price_cell_is_missing() {
        let bytes: &[u8] = b"Date,A,B\n02-01-2023,100,5\n03-01-2023,\xa3101,6\n";
        let ds = from_reader(bytes, &TableFormat::default()).unwrap();
        assert_eq!(ds.column("A").unwrap(), &[Some(100.0), None]);
        assert_eq!(ds.column("B").unwrap(), &[Some(5.0), Some(6.0)]);
    }

    #[test]
    fn invalid_utf8_date_cell_drops_row() {
        let bytes: &[u8] = b"Date,A\n02-01-2023,1\n0\xff-01-2023,2\n";
        let ds = from_reader(bytes, &TableFormat::default()).unwrap();
        assert_eq!(ds.dates(), &[d(2023, 1, 2)]);
    }
}
