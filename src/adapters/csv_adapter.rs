//! CSV file adapter for master datasets and hot-reload snapshots.

use crate::domain::dataset::{Dataset, TableFormat};
use crate::domain::error::DataError;
use crate::domain::ingest;
use log::info;
use std::fs::{self, File};
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

fn io_error(path: &Path, err: std::io::Error) -> DataError {
    DataError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

pub fn read_dataset(path: &Path, format: &TableFormat) -> Result<Dataset, DataError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    ingest::from_reader(file, format)
}

/// Serialize in the tabular output format: date column first, then
/// `columns` (default: the dataset's own order). Missing cells are empty.
pub fn write_dataset<W: Write>(
    writer: W,
    dataset: &Dataset,
    format: &TableFormat,
    columns: Option<&[String]>,
) -> Result<(), DataError> {
    let order: Vec<String> = match columns {
        Some(cols) => {
            if let Some(unknown) = cols.iter().find(|c| !dataset.has_symbol(c)) {
                return Err(DataError::Malformed {
                    reason: format!("unknown column {unknown}"),
                });
            }
            cols.to_vec()
        }
        None => dataset.symbols().map(str::to_string).collect(),
    };

    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = Vec::with_capacity(order.len() + 1);
    header.push(format.date_column.clone());
    header.extend(order.iter().cloned());
    wtr.write_record(&header)?;

    for (date, values) in dataset.rows(&order) {
        let mut record = Vec::with_capacity(values.len() + 1);
        let mut day = String::new();
        write!(day, "{}", date.format(&format.date_format)).map_err(|_| DataError::Malformed {
            reason: format!("invalid date format {}", format.date_format),
        })?;
        record.push(day);
        record.extend(
            values
                .into_iter()
                .map(|v| v.map(|p| p.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(|e| DataError::Csv {
        reason: e.to_string(),
    })
}

pub fn to_csv_string(
    dataset: &Dataset,
    format: &TableFormat,
    columns: Option<&[String]>,
) -> Result<String, DataError> {
    let mut buf = Vec::new();
    write_dataset(&mut buf, dataset, format, columns)?;
    String::from_utf8(buf).map_err(|e| DataError::Csv {
        reason: e.to_string(),
    })
}

pub fn save_dataset(
    path: &Path,
    dataset: &Dataset,
    format: &TableFormat,
    columns: Option<&[String]>,
) -> Result<(), DataError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    write_dataset(file, dataset, format, columns)?;
    info!(
        "saved {} rows, {} symbols to {}",
        dataset.len(),
        dataset.symbol_count(),
        path.display()
    );
    Ok(())
}

/// Write to a sibling temp file, then rename over `path`. A failed write
/// leaves any existing file intact.
pub fn replace_dataset(
    path: &Path,
    dataset: &Dataset,
    format: &TableFormat,
    columns: Option<&[String]>,
) -> Result<(), DataError> {
    let tmp = path.with_extension("csv.tmp");
    if let Err(err) = save_dataset(&tmp, dataset, format, columns) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}

/// Persist a merged dataset to a scratch location so the latest fetch
/// survives a restart.
pub fn write_snapshot(path: &Path, dataset: &Dataset, format: &TableFormat) -> Result<(), DataError> {
    replace_dataset(path, dataset, format, None)
}
