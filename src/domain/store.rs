//! The authoritative dataset holder.
//!
//! `DatasetStore` owns the live [`Dataset`] behind an `Arc`. Every mutation
//! builds a complete new dataset and swaps the pointer, so snapshots handed
//! out earlier stay valid and are never observed half-updated. Derived
//! metadata is refreshed before listeners run.
//!
//! Besides the live dataset the store keeps:
//! - the *base*: the dataset from the last load or update;
//! - a per-symbol cache of the most recently merged fragment, in merge order.
//!
//! Dropping a symbol rebuilds the live dataset from the base plus the
//! remaining fragments.

use crate::domain::dataset::{Dataset, TableFormat};
use crate::domain::error::DataError;
use crate::domain::events::{ListenerId, Listeners, StoreEvent};
use crate::domain::ingest;
use crate::domain::statistics::DatasetStatistics;
use chrono::NaiveDate;
use log::{info, warn};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Loaded,
    Updated,
}

#[derive(Debug, Default)]
pub struct DatasetStore {
    format: TableFormat,
    current: Option<Arc<Dataset>>,
    base: Option<Arc<Dataset>>,
    fragments: Vec<(String, Dataset)>,
    symbols: Vec<String>,
    date_range: Option<(NaiveDate, NaiveDate)>,
    listeners: Listeners,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format: TableFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn format(&self) -> &TableFormat {
        &self.format
    }

    /// Snapshot of the live dataset.
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.current.clone()
    }

    /// Sorted symbol list of the live dataset.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_range
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.binary_search_by(|s| s.as_str().cmp(symbol)).is_ok()
    }

    /// Symbols with a cached fragment, sorted.
    pub fn cached_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.fragments.iter().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols
    }

    pub fn fragment(&self, symbol: &str) -> Option<&Dataset> {
        self.fragments
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, data)| data)
    }

    pub fn statistics(&self) -> DatasetStatistics {
        DatasetStatistics::compute(self.current.as_deref())
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Replace everything with a dataset parsed from CSV text. Clears the
    /// fragment cache. On failure the previous state is untouched.
    pub fn load_csv_str(&mut self, text: &str) -> Result<(), DataError> {
        match ingest::parse_csv_str(text, &self.format) {
            Ok(dataset) => {
                info!("loaded {}", describe(&dataset));
                self.replace_base(dataset, Change::Loaded);
                Ok(())
            }
            Err(err) => Err(self.fail("failed to load data", err)),
        }
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), DataError> {
        let path = path.as_ref();
        let parsed = File::open(path)
            .map_err(|e| DataError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
            .and_then(|file| ingest::from_reader(file, &self.format));

        match parsed {
            Ok(dataset) => {
                info!("loaded {} from {}", describe(&dataset), path.display());
                self.replace_base(dataset, Change::Loaded);
                Ok(())
            }
            Err(err) => Err(self.fail("failed to load data", err)),
        }
    }

    /// Install an already-structured dataset as the new base and live
    /// dataset. Like a load, this discards every cached fragment.
    pub fn update(&mut self, dataset: Dataset) -> Result<(), DataError> {
        if dataset.is_empty() || dataset.symbol_count() == 0 {
            return Err(self.fail(
                "failed to update data",
                DataError::Malformed {
                    reason: "cannot update with empty data".into(),
                },
            ));
        }
        info!("updated: {}", describe(&dataset));
        self.replace_base(dataset, Change::Updated);
        Ok(())
    }

    /// Merge a fragment into the live dataset; newer cells win. Each symbol
    /// of the fragment replaces its cached fragment.
    pub fn merge(&mut self, fragment: Dataset) -> Result<(), DataError> {
        if fragment.is_empty() || fragment.symbol_count() == 0 {
            return Err(self.fail(
                "failed to merge data",
                DataError::EmptyFragment {
                    reason: "fragment has no dates or no symbols".into(),
                },
            ));
        }
        if fragment.missing_cells() == fragment.len() * fragment.symbol_count() {
            return Err(self.fail(
                "failed to merge data",
                DataError::EmptyFragment {
                    reason: "fragment has no prices".into(),
                },
            ));
        }

        for symbol in fragment.symbols() {
            self.fragments.retain(|(s, _)| s != symbol);
            if let Some(piece) = fragment.fragment_for(symbol).filter(|p| !p.is_empty()) {
                self.fragments.push((symbol.to_string(), piece));
            }
        }

        let merged = match self.current.as_deref() {
            Some(existing) => existing.merge(&fragment),
            None => fragment,
        };
        info!("merged: {}", describe(&merged));
        self.install(merged, Change::Updated);
        Ok(())
    }

    /// Remove a symbol and rebuild from the base plus the remaining cached
    /// fragments. Returns false when the symbol was not held at all.
    pub fn drop_symbol(&mut self, symbol: &str) -> bool {
        let cached = self.fragments.iter().any(|(s, _)| s == symbol);
        if !cached && !self.has_symbol(symbol) {
            return false;
        }
        self.fragments.retain(|(s, _)| s != symbol);

        let base = self
            .base
            .as_deref()
            .map(|b| b.without_symbol(symbol))
            .filter(|b| !b.is_empty());
        let rebuilt = self
            .fragments
            .iter()
            .fold(base.clone().unwrap_or_default(), |acc, (_, piece)| acc.merge(piece));

        if rebuilt.is_empty() || rebuilt.symbol_count() == 0 {
            self.clear();
            return true;
        }

        info!("dropped {}; rebuilt: {}", symbol, describe(&rebuilt));
        self.base = base.map(Arc::new);
        self.install(rebuilt, Change::Updated);
        true
    }

    /// Discard the dataset, the base and every cached fragment.
    pub fn clear(&mut self) {
        self.base = None;
        self.fragments.clear();
        self.current = None;
        self.date_range = None;
        let had_symbols = !self.symbols.is_empty();
        self.symbols.clear();
        info!("cleared all data");

        self.listeners
            .emit(&StoreEvent::Updated(Arc::new(Dataset::default())));
        if had_symbols {
            self.listeners.emit(&StoreEvent::SymbolsChanged(Vec::new()));
        }
    }

    fn replace_base(&mut self, dataset: Dataset, change: Change) {
        self.fragments.clear();
        self.base = Some(Arc::new(dataset.clone()));
        self.install(dataset, change);
    }

    fn install(&mut self, dataset: Dataset, change: Change) {
        let mut symbols: Vec<String> = dataset.symbols().map(str::to_string).collect();
        symbols.sort();
        let symbols_changed = symbols != self.symbols;

        let dataset = Arc::new(dataset);
        self.date_range = dataset.date_range();
        self.symbols = symbols;
        self.current = Some(Arc::clone(&dataset));

        let event = match change {
            Change::Loaded => StoreEvent::Loaded(dataset),
            Change::Updated => StoreEvent::Updated(dataset),
        };
        self.listeners.emit(&event);
        if symbols_changed {
            self.listeners
                .emit(&StoreEvent::SymbolsChanged(self.symbols.clone()));
        }
    }

    fn fail(&mut self, context: &str, err: DataError) -> DataError {
        warn!("{context}: {err}");
        self.listeners
            .emit(&StoreEvent::Error(format!("{context}: {err}")));
        err
    }
}

fn describe(dataset: &Dataset) -> String {
    format!("{} rows, {} symbols", dataset.len(), dataset.symbol_count())
}
