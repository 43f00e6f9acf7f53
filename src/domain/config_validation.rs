//! Configuration validation.
//!
//! Checks the `[data]` and `[fetch]` sections before any dataset is touched.

use crate::domain::error::AppError;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_source::Interval;
use chrono::NaiveDate;
use std::fmt::Write;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), AppError> {
    validate_date_column(config)?;
    validate_date_format(config)?;
    validate_interval(config)?;
    Ok(())
}

fn validate_date_column(config: &dyn ConfigPort) -> Result<(), AppError> {
    match config.get_string("data", "date_column") {
        Some(s) if s.trim().is_empty() => Err(AppError::ConfigInvalid {
            section: "data".to_string(),
            key: "date_column".to_string(),
            reason: "date_column must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_date_format(config: &dyn ConfigPort) -> Result<(), AppError> {
    match config.get_string("data", "date_format") {
        None => Ok(()),
        Some(format) => check_date_format(&format).map_err(|reason| AppError::ConfigInvalid {
            section: "data".to_string(),
            key: "date_format".to_string(),
            reason,
        }),
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), AppError> {
    match config.get_non_empty("fetch", "interval") {
        None => Ok(()),
        Some(value) => value
            .parse::<Interval>()
            .map(|_| ())
            .map_err(|reason| AppError::ConfigInvalid {
                section: "fetch".to_string(),
                key: "interval".to_string(),
                reason,
            }),
    }
}

/// A usable format renders a date and parses it back to the same day.
pub fn check_date_format(format: &str) -> Result<(), String> {
    if format.trim().is_empty() {
        return Err("date format must not be empty".to_string());
    }
    let sample = NaiveDate::from_ymd_opt(2001, 12, 31).ok_or("invalid sample date")?;
    let mut rendered = String::new();
    if write!(rendered, "{}", sample.format(format)).is_err() {
        return Err(format!("'{format}' is not a valid date format"));
    }
    match NaiveDate::parse_from_str(&rendered, format) {
        Ok(parsed) if parsed == sample => Ok(()),
        _ => Err(format!(
            "'{format}' does not identify a calendar day unambiguously"
        )),
    }
}
