//! Domain error types.
//!
//! Calculations fail in exactly two ways: the caller asked for something
//! invalid ([`InputError`]) or the dataset cannot answer ([`DataError`]).
//! [`AppError`] wraps both for the command-line layer, together with
//! configuration and I/O failures.

use chrono::NaiveDate;

/// A caller-supplied argument violates a precondition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("symbol must be a non-empty identifier")]
    EmptySymbol,

    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("quantity must be positive, got {quantity}")]
    NonPositiveQuantity { quantity: f64 },

    #[error("purchase date {purchase} must be before sell date {sell}")]
    DatesNotOrdered { purchase: NaiveDate, sell: NaiveDate },

    #[error("purchase date {date} is before dataset start {start}")]
    PurchaseBeforeRange { date: NaiveDate, start: NaiveDate },

    #[error("sell date {date} is after dataset end {end}")]
    SellAfterRange { date: NaiveDate, end: NaiveDate },

    #[error("{field} date '{value}' does not match {format}")]
    InvalidDate {
        field: String,
        value: String,
        format: String,
    },
}

/// The dataset is absent, malformed, or lacks a resolvable price.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("no dataset loaded")]
    NoDataset,

    #[error("missing date column '{column}'")]
    MissingDateColumn { column: String },

    #[error("invalid column header at position {position}: {reason}")]
    InvalidHeader { position: usize, reason: String },

    #[error("no rows with a parseable date (format {format})")]
    NoRows { format: String },

    #[error("no column contains a valid numeric value")]
    NoNumericValues,

    #[error("no price for {symbol} on or before {date}")]
    NoPriceOnOrBefore { symbol: String, date: NaiveDate },

    #[error("malformed dataset: {reason}")]
    Malformed { reason: String },

    #[error("empty fragment: {reason}")]
    EmptyFragment { reason: String },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error("failed to access {path}: {reason}")]
    Io { path: String, reason: String },
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Csv {
            reason: err.to_string(),
        }
    }
}

/// Outcome of a failed price or trade computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

impl CalcError {
    pub fn is_input(&self) -> bool {
        matches!(self, CalcError::Input(_))
    }

    pub fn is_data(&self) -> bool {
        matches!(self, CalcError::Data(_))
    }
}

/// Top-level error type for the command-line application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::Calc(err.into())
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::Calc(err.into())
    }
}

impl From<&AppError> for std::process::ExitCode {
    fn from(err: &AppError) -> Self {
        let code: u8 = match err {
            AppError::Io(_) => 1,
            AppError::ConfigParse { .. }
            | AppError::ConfigMissing { .. }
            | AppError::ConfigInvalid { .. } => 2,
            AppError::Calc(CalcError::Input(_)) => 4,
            AppError::Calc(CalcError::Data(_)) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
