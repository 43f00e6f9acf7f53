//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter;
use crate::adapters::csv_price_source::CsvPriceSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::batch::{evaluate_batch, parse_symbols, BatchResult};
use crate::domain::config_validation::validate_data_config;
use crate::domain::dataset::{TableFormat, DEFAULT_DATE_COLUMN, DEFAULT_DATE_FORMAT};
use crate::domain::error::{AppError, DataError, InputError};
use crate::domain::statistics::DatasetStatistics;
use crate::domain::store::DatasetStore;
use crate::domain::trade::{TradeCalculator, TradeResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_source::{Interval, PriceSource};

#[derive(Parser, Debug)]
#[command(name = "stockcalc", about = "Trade profit/loss over a local daily price dataset")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// INI configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Master dataset CSV (overrides [data] path)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Profit/loss of a single trade
    Trade {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        quantity: f64,
        #[arg(long)]
        buy: String,
        #[arg(long)]
        sell: String,
    },
    /// The same trade across several symbols
    Batch {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        symbols: String,
        #[arg(short, long)]
        quantity: f64,
        #[arg(long)]
        buy: String,
        #[arg(long)]
        sell: String,
    },
    /// Show dataset statistics
    Info {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Fetch prices from a source directory and merge them into the dataset
    Fetch {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        symbols: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        source_dir: Option<PathBuf>,
        #[arg(long)]
        interval: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-serialize the dataset with a chosen column order
    Export {
        #[command(flatten)]
        data: DataArgs,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        columns: Option<String>,
    },
}

/// Settings resolved from the `[data]` and `[fetch]` config sections.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: Option<PathBuf>,
    pub format: TableFormat,
    pub snapshot_path: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub interval: Interval,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Trade {
            data,
            symbol,
            quantity,
            buy,
            sell,
        } => run_trade(&data, &symbol, quantity, &buy, &sell),
        Command::Batch {
            data,
            symbols,
            quantity,
            buy,
            sell,
        } => run_batch(&data, &symbols, quantity, &buy, &sell),
        Command::Info { data } => run_info(&data),
        Command::Fetch {
            data,
            symbols,
            start,
            end,
            source_dir,
            interval,
            output,
        } => run_fetch(
            &data,
            &symbols,
            &start,
            &end,
            source_dir.as_deref(),
            interval.as_deref(),
            output.as_deref(),
        ),
        Command::Export {
            data,
            output,
            columns,
        } => run_export(&data, &output, columns.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AppError> {
    FileConfigAdapter::from_file(path).map_err(|e| AppError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_data_settings(config: &dyn ConfigPort) -> Result<DataSettings, AppError> {
    validate_data_config(config)?;

    let interval = match config.get_non_empty("fetch", "interval") {
        Some(value) => value.parse::<Interval>().map_err(|reason| AppError::ConfigInvalid {
            section: "fetch".into(),
            key: "interval".into(),
            reason,
        })?,
        None => Interval::default(),
    };

    Ok(DataSettings {
        path: config.get_non_empty("data", "path").map(PathBuf::from),
        format: TableFormat {
            date_column: config
                .get_non_empty("data", "date_column")
                .unwrap_or_else(|| DEFAULT_DATE_COLUMN.to_string()),
            date_format: config
                .get_non_empty("data", "date_format")
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
        },
        snapshot_path: config.get_non_empty("data", "snapshot_path").map(PathBuf::from),
        source_dir: config.get_non_empty("fetch", "source_dir").map(PathBuf::from),
        interval,
    })
}

/// Resolve settings from an optional config file, then apply the `--data` override.
pub fn resolve_settings(args: &DataArgs) -> Result<DataSettings, AppError> {
    let mut settings = match &args.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            build_data_settings(&load_config(path)?)?
        }
        None => build_data_settings(&FileConfigAdapter::empty())?,
    };
    if let Some(data) = &args.data {
        settings.path = Some(data.clone());
    }
    Ok(settings)
}

fn dataset_path(settings: &DataSettings) -> Result<&Path, AppError> {
    settings
        .path
        .as_deref()
        .ok_or_else(|| AppError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

pub fn open_store(settings: &DataSettings) -> Result<DatasetStore, AppError> {
    let path = dataset_path(settings)?;
    let mut store = DatasetStore::with_format(settings.format.clone());
    store.load_file(path)?;
    Ok(store)
}

pub fn parse_cli_date(value: &str, format: &TableFormat, field: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(value.trim(), &format.date_format).map_err(|_| InputError::InvalidDate {
        field: field.into(),
        value: value.into(),
        format: format.date_format.clone(),
    })
}

pub fn run_trade(args: &DataArgs, symbol: &str, quantity: f64, buy: &str, sell: &str) -> Result<(), AppError> {
    let settings = resolve_settings(args)?;
    let buy_date = parse_cli_date(buy, &settings.format, "buy")?;
    let sell_date = parse_cli_date(sell, &settings.format, "sell")?;
    let store = open_store(&settings)?;

    let result = TradeCalculator::from_store(&store).compute(symbol, quantity, buy_date, sell_date)?;
    print!("{}", format_trade(&result, buy_date, sell_date, &settings.format));
    Ok(())
}

pub fn run_batch(args: &DataArgs, symbols: &str, quantity: f64, buy: &str, sell: &str) -> Result<(), AppError> {
    let settings = resolve_settings(args)?;
    let symbols = parse_symbols(symbols)?;
    let buy_date = parse_cli_date(buy, &settings.format, "buy")?;
    let sell_date = parse_cli_date(sell, &settings.format, "sell")?;
    let store = open_store(&settings)?;

    let calculator = TradeCalculator::from_store(&store);
    let batch = evaluate_batch(&calculator, &symbols, quantity, buy_date, sell_date);
    print!("{}", format_batch(&batch, &settings.format));
    Ok(())
}

pub fn run_info(args: &DataArgs) -> Result<(), AppError> {
    let settings = resolve_settings(args)?;
    let store = open_store(&settings)?;
    print!("{}", format_statistics(&store.statistics(), &settings.format));
    Ok(())
}

pub fn run_fetch(
    args: &DataArgs,
    symbols: &str,
    start: &str,
    end: &str,
    source_dir: Option<&Path>,
    interval: Option<&str>,
    output: Option<&Path>,
) -> Result<(), AppError> {
    let settings = resolve_settings(args)?;
    let symbols = parse_symbols(symbols)?;
    let start = parse_cli_date(start, &settings.format, "start")?;
    let end = parse_cli_date(end, &settings.format, "end")?;
    let interval = match interval {
        Some(value) => value.parse::<Interval>().map_err(|reason| AppError::ConfigInvalid {
            section: "cli".into(),
            key: "interval".into(),
            reason,
        })?,
        None => settings.interval,
    };
    let source_dir = source_dir
        .map(Path::to_path_buf)
        .or_else(|| settings.source_dir.clone())
        .ok_or_else(|| AppError::ConfigMissing {
            section: "fetch".into(),
            key: "source_dir".into(),
        })?;

    let master = dataset_path(&settings)?;
    let mut store = DatasetStore::with_format(settings.format.clone());
    if master.exists() {
        store.load_file(master)?;
    } else {
        info!("{} does not exist yet; starting empty", master.display());
    }

    eprintln!(
        "Fetching {} symbols ({} to {}, {})...",
        symbols.len(),
        start,
        end,
        interval
    );
    let source = CsvPriceSource::new(source_dir);
    let fragment = source.fetch_many(&symbols, start, end, interval)?;

    if let Some(snapshot) = &settings.snapshot_path {
        let preview = match store.current() {
            Some(existing) => existing.merge(&fragment),
            None => fragment.clone(),
        };
        csv_adapter::write_snapshot(snapshot, &preview, &settings.format)?;
        eprintln!("Snapshot written to: {}", snapshot.display());
    }

    store.merge(fragment)?;
    let merged = store.current().ok_or(DataError::NoDataset)?;
    let target = output.unwrap_or(master);
    csv_adapter::replace_dataset(target, &merged, &settings.format, None)?;

    eprintln!(
        "Merged {} rows, {} symbols into {}",
        merged.len(),
        merged.symbol_count(),
        target.display()
    );
    Ok(())
}

pub fn run_export(args: &DataArgs, output: &Path, columns: Option<&str>) -> Result<(), AppError> {
    let settings = resolve_settings(args)?;
    let columns = columns.map(parse_symbols).transpose()?;
    let store = open_store(&settings)?;
    let dataset = store.current().ok_or(DataError::NoDataset)?;

    csv_adapter::replace_dataset(output, &dataset, &settings.format, columns.as_deref())?;
    eprintln!("Dataset written to: {}", output.display());
    Ok(())
}

fn fmt_date(date: NaiveDate, format: &TableFormat) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    if write!(out, "{}", date.format(&format.date_format)).is_err() {
        out = date.to_string();
    }
    out
}

fn signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.2}")
    } else {
        format!("{value:.2}")
    }
}

fn requested_note(actual: NaiveDate, requested: NaiveDate, format: &TableFormat) -> String {
    if actual == requested {
        String::new()
    } else {
        format!(" (requested {})", fmt_date(requested, format))
    }
}

pub fn format_trade(
    result: &TradeResult,
    requested_buy: NaiveDate,
    requested_sell: NaiveDate,
    format: &TableFormat,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Symbol:          {}\n", result.symbol));
    out.push_str(&format!("Quantity:        {}\n", result.quantity));
    out.push_str(&format!(
        "Purchase:        {}{} @ {:.2}\n",
        fmt_date(result.purchase_date, format),
        requested_note(result.purchase_date, requested_buy, format),
        result.purchase_price
    ));
    out.push_str(&format!(
        "Sell:            {}{} @ {:.2}\n",
        fmt_date(result.sell_date, format),
        requested_note(result.sell_date, requested_sell, format),
        result.sell_price
    ));
    out.push_str(&format!("Purchase total:  {:.2}\n", result.purchase_total));
    out.push_str(&format!("Sell total:      {:.2}\n", result.sell_total));
    out.push_str(&format!(
        "Profit:          {} ({:.2}%)\n",
        signed(result.profit),
        result.return_pct()
    ));
    out
}

pub fn format_batch(batch: &BatchResult, format: &TableFormat) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:>10} {:>10} {:>12} {:>12} {:>12}\n",
        "Symbol", "Bought", "Sold", "Buy", "Sell", "Profit"
    ));
    for (symbol, outcome) in &batch.entries {
        match outcome {
            Ok(r) => out.push_str(&format!(
                "{:<12} {:>10} {:>10} {:>12.2} {:>12.2} {:>12}\n",
                symbol,
                fmt_date(r.purchase_date, format),
                fmt_date(r.sell_date, format),
                r.purchase_price,
                r.sell_price,
                signed(r.profit)
            )),
            Err(e) => out.push_str(&format!("{:<12} error: {}\n", symbol, e)),
        }
    }
    out.push_str(&format!(
        "\n{} of {} succeeded, total profit {}\n",
        batch.successes().count(),
        batch.len(),
        signed(batch.total_profit())
    ));
    out
}

pub fn format_statistics(stats: &DatasetStatistics, format: &TableFormat) -> String {
    let mut out = String::new();
    out.push_str(&format!("Rows:           {}\n", stats.rows));
    out.push_str(&format!("Symbols:        {}\n", stats.symbols));
    match stats.date_range {
        Some((start, end)) => out.push_str(&format!(
            "Date range:     {} to {}\n",
            fmt_date(start, format),
            fmt_date(end, format)
        )),
        None => out.push_str("Date range:     N/A\n"),
    }
    out.push_str(&format!("Missing cells:  {}\n", stats.missing_cells));

    if !stats.coverage.is_empty() {
        out.push_str("\nPer-symbol coverage:\n");
        for c in &stats.coverage {
            let span = match (c.first, c.last) {
                (Some(first), Some(last)) => {
                    format!("{} to {}", fmt_date(first, format), fmt_date(last, format))
                }
                _ => "no prices".to_string(),
            };
            out.push_str(&format!(
                "  {}: {} prices ({:.1}%), {}\n",
                c.symbol,
                c.present,
                c.coverage_pct(stats.rows),
                span
            ));
        }
    }
    out
}
