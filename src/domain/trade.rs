//! Single-trade profit/loss computation.

use crate::domain::dataset::Dataset;
use crate::domain::error::{CalcError, DataError, InputError};
use crate::domain::resolver::{resolve_price, TradingDay};
use crate::domain::store::DatasetStore;
use chrono::NaiveDate;
use std::sync::Arc;

/// Outcome of buying `quantity` units on one date and selling on another.
/// The dates are the ones prices were actually observed on, which may be
/// earlier than the requested dates.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeResult {
    pub symbol: String,
    pub quantity: f64,
    pub purchase_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub purchase_price: f64,
    pub sell_price: f64,
    pub purchase_total: f64,
    pub sell_total: f64,
    pub profit: f64,
}

impl TradeResult {
    /// profit / purchase_total, as a percentage
    pub fn return_pct(&self) -> f64 {
        if self.purchase_total == 0.0 {
            0.0
        } else {
            self.profit / self.purchase_total * 100.0
        }
    }
}

/// Computes trades against one immutable dataset snapshot. A store mutation
/// after construction does not affect an existing calculator.
#[derive(Debug, Clone)]
pub struct TradeCalculator {
    dataset: Option<Arc<Dataset>>,
}

impl TradeCalculator {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset: Some(dataset),
        }
    }

    pub fn from_store(store: &DatasetStore) -> Self {
        Self {
            dataset: store.current(),
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_deref()
    }

    pub fn compute<D: TradingDay>(
        &self,
        symbol: &str,
        quantity: f64,
        purchase_date: D,
        sell_date: D,
    ) -> Result<TradeResult, CalcError> {
        let purchase_date = purchase_date.trading_day();
        let sell_date = sell_date.trading_day();
        let dataset = self.validate(symbol, quantity, purchase_date, sell_date)?;

        let purchase = resolve_price(dataset, symbol, purchase_date)?;
        let sell = resolve_price(dataset, symbol, sell_date)?;

        let purchase_total = purchase.price * quantity;
        let sell_total = sell.price * quantity;

        Ok(TradeResult {
            symbol: symbol.to_string(),
            quantity,
            purchase_date: purchase.date,
            sell_date: sell.date,
            purchase_price: purchase.price,
            sell_price: sell.price,
            purchase_total,
            sell_total,
            profit: sell_total - purchase_total,
        })
    }

    /// Checks run in a fixed order and the first failure wins. The range
    /// check uses the requested dates, before any price lookup.
    fn validate(
        &self,
        symbol: &str,
        quantity: f64,
        purchase_date: NaiveDate,
        sell_date: NaiveDate,
    ) -> Result<&Dataset, CalcError> {
        if symbol.trim().is_empty() {
            return Err(InputError::EmptySymbol.into());
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(InputError::NonPositiveQuantity { quantity }.into());
        }
        if purchase_date >= sell_date {
            return Err(InputError::DatesNotOrdered {
                purchase: purchase_date,
                sell: sell_date,
            }
            .into());
        }

        let dataset = self.dataset.as_deref().ok_or(DataError::NoDataset)?;
        let (start, end) = dataset.date_range().ok_or(DataError::NoDataset)?;
        if purchase_date < start {
            return Err(InputError::PurchaseBeforeRange {
                date: purchase_date,
                start,
            }
            .into());
        }
        if sell_date > end {
            return Err(InputError::SellAfterRange {
                date: sell_date,
                end,
            }
            .into());
        }

        Ok(dataset)
    }
}
