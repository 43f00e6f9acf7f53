//! Multi-symbol evaluation with per-symbol failure isolation.

use crate::domain::error::{CalcError, InputError};
use crate::domain::resolver::TradingDay;
use crate::domain::trade::{TradeCalculator, TradeResult};
use std::collections::HashMap;

pub type TradeOutcome = Result<TradeResult, CalcError>;

/// One entry per requested symbol, in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResult {
    pub entries: Vec<(String, TradeOutcome)>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&TradeOutcome> {
        self.entries
            .iter()
            .rev()
            .find(|(s, _)| s == symbol)
            .map(|(_, outcome)| outcome)
    }

    pub fn successes(&self) -> impl Iterator<Item = &TradeResult> {
        self.entries.iter().filter_map(|(_, o)| o.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &CalcError)> {
        self.entries
            .iter()
            .filter_map(|(s, o)| o.as_ref().err().map(|e| (s.as_str(), e)))
    }

    /// Sum of profits over successful entries.
    pub fn total_profit(&self) -> f64 {
        self.successes().map(|r| r.profit).sum()
    }

    /// Keyed view; a repeated symbol keeps its last outcome.
    pub fn into_map(self) -> HashMap<String, TradeOutcome> {
        self.entries.into_iter().collect()
    }
}

/// Split a comma-separated symbol list. Tokens are trimmed; a blank token
/// (including an entirely blank list) is rejected.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, InputError> {
    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            if token.is_empty() {
                Err(InputError::EmptySymbol)
            } else {
                Ok(token.to_string())
            }
        })
        .collect()
}

/// Evaluate the same trade for every symbol. A failing symbol becomes an
/// error entry and never affects the others.
pub fn evaluate_batch<S, D>(
    calculator: &TradeCalculator,
    symbols: &[S],
    quantity: f64,
    purchase_date: D,
    sell_date: D,
) -> BatchResult
where
    S: AsRef<str>,
    D: TradingDay + Copy,
{
    let entries = symbols
        .iter()
        .map(|symbol| {
            let symbol = symbol.as_ref();
            let outcome = calculator.compute(symbol, quantity, purchase_date, sell_date);
            (symbol.to_string(), outcome)
        })
        .collect();
    BatchResult { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Dataset;
    use crate::domain::error::DataError;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calculator() -> TradeCalculator {
        let ds = Dataset::new(
            vec![d(2023, 1, 2), d(2023, 1, 3), d(2023, 1, 4)],
            vec![
                ("GOOD".into(), vec![Some(10.0), Some(11.0), Some(12.0)]),
                ("LATE".into(), vec![None, None, Some(5.0)]),
            ],
        )
        .unwrap();
        TradeCalculator::new(Arc::new(ds))
    }

    #[test]
    fn isolates_failures() {
        let result = evaluate_batch(&calculator(), &["GOOD", "BAD"], 10.0, d(2023, 1, 2), d(2023, 1, 4));
        assert_eq!(result.len(), 2);

        let good = result.get("GOOD").unwrap().as_ref().unwrap();
        assert_eq!(good.profit, 20.0);

        let bad = result.get("BAD").unwrap().as_ref().unwrap_err();
        assert_eq!(
            bad,
            &CalcError::Input(InputError::UnknownSymbol {
                symbol: "BAD".into()
            })
        );
    }

    #[test]
    fn good_result_matches_single_computation() {
        let calc = calculator();
        let alone = calc.compute("GOOD", 10.0, d(2023, 1, 2), d(2023, 1, 4)).unwrap();
        let batch = evaluate_batch(&calc, &["BAD", "GOOD", "LATE"], 10.0, d(2023, 1, 2), d(2023, 1, 4));
        assert_eq!(batch.get("GOOD").unwrap().as_ref().unwrap(), &alone);
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let batch = evaluate_batch(
            &calculator(),
            &["LATE", "GOOD", "LATE"],
            1.0,
            d(2023, 1, 2),
            d(2023, 1, 4),
        );
        let order: Vec<&str> = batch.entries.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["LATE", "GOOD", "LATE"]);
        assert_eq!(batch.failures().count(), 2);
        assert!(matches!(
            batch.failures().next(),
            Some(("LATE", CalcError::Data(DataError::NoPriceOnOrBefore { .. })))
        ));

        let map = batch.into_map();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn total_profit_sums_successes() {
        let batch = evaluate_batch(&calculator(), &["GOOD", "GOOD", "BAD"], 2.0, d(2023, 1, 2), d(2023, 1, 3));
        assert_eq!(batch.successes().count(), 2);
        assert_eq!(batch.total_profit(), 4.0);
    }

    #[test]
    fn shared_input_error_is_reported_per_symbol() {
        let batch = evaluate_batch(&calculator(), &["GOOD", "LATE"], 0.0, d(2023, 1, 2), d(2023, 1, 3));
        assert_eq!(batch.len(), 2);
        assert!(batch
            .entries
            .iter()
            .all(|(_, o)| matches!(o, Err(CalcError::Input(InputError::NonPositiveQuantity { .. })))));
    }

    #[test]
    fn empty_request_is_empty_result() {
        let batch = evaluate_batch::<&str, NaiveDate>(&calculator(), &[], 1.0, d(2023, 1, 2), d(2023, 1, 3));
        assert!(batch.is_empty());
        assert_eq!(batch.total_profit(), 0.0);
    }

    #[test]
    fn parse_symbols_trims_tokens() {
        assert_eq!(
            parse_symbols(" Gold, Silver ,CBA.AX").unwrap(),
            vec!["Gold", "Silver", "CBA.AX"]
        );
    }

    #[test]
    fn parse_symbols_rejects_blank_tokens() {
        assert_eq!(parse_symbols("Gold,,Silver"), Err(InputError::EmptySymbol));
        assert_eq!(parse_symbols("  "), Err(InputError::EmptySymbol));
    }
}
