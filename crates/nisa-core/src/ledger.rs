//! Transaction Ledger
//!
//! Append-only store of NISA transactions plus the externally supplied
//! market prices and the current tax-year window.

use std::collections::HashMap;

use crate::error::{NisaError, NisaResult};
use crate::types::{QuotaAmounts, QuotaType, RolloverSummary, Transaction};

#[derive(Debug, Clone, Default)]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
    /// Indices into `transactions`, per symbol, in append order
    by_symbol: HashMap<String, Vec<usize>>,
    prices: HashMap<String, f64>,
    /// None until the first rollover: every transaction is "current"
    tax_year: Option<i32>,
    carried_over: QuotaAmounts,
    /// Cumulative quota released back to the lifetime limit by rollovers
    released_lifetime: QuotaAmounts,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from historical transactions without validating them
    pub fn from_transactions(transactions: impl IntoIterator<Item = Transaction>) -> Self {
        let mut ledger = Self::new();
        for tx in transactions {
            ledger.add_transaction(tx);
        }
        ledger
    }

    /// Append a transaction. No validation happens here.
    pub fn add_transaction(&mut self, tx: Transaction) {
        let index = self.transactions.len();
        tracing::debug!(
            "Ledger append #{}: {} {} x{} ({})",
            index,
            tx.kind(),
            tx.symbol(),
            tx.quantity(),
            tx.quota_type()
        );
        self.by_symbol
            .entry(tx.symbol().to_string())
            .or_default()
            .push(index);
        self.transactions.push(tx);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Transactions of one symbol, in append order
    pub fn symbol_transactions<'a>(&'a self, symbol: &str) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.by_symbol
            .get(symbol)
            .map(|indices| indices.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.transactions[i])
    }

    /// Symbols in order of first appearance
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<(&str, usize)> = self
            .by_symbol
            .iter()
            .filter_map(|(symbol, indices)| indices.first().map(|&i| (symbol.as_str(), i)))
            .collect();
        symbols.sort_by_key(|&(_, first)| first);
        symbols.into_iter().map(|(symbol, _)| symbol).collect()
    }

    /// Net shares held: Σ buys − Σ sells
    pub fn held_quantity(&self, symbol: &str) -> i64 {
        self.symbol_transactions(symbol)
            .map(|tx| match tx {
                Transaction::Buy(_) => tx.quantity() as i64,
                Transaction::Sell(_) => -(tx.quantity() as i64),
            })
            .sum()
    }

    /// Net shares of `symbol` held under one quota bucket
    pub fn held_quantity_in(&self, symbol: &str, quota_type: QuotaType) -> i64 {
        self.symbol_transactions(symbol)
            .filter(|tx| tx.quota_type() == quota_type)
            .map(|tx| match tx {
                Transaction::Buy(_) => tx.quantity() as i64,
                Transaction::Sell(_) => -(tx.quantity() as i64),
            })
            .sum()
    }

    /// Record the latest known market price, replacing any previous one
    pub fn set_current_price(&mut self, symbol: &str, price: f64) -> NisaResult<()> {
        if !price.is_finite() || price <= 0.0 {
            return Err(NisaError::InvalidPrice {
                symbol: symbol.to_string(),
                price,
            });
        }
        self.prices.insert(symbol.to_string(), price);
        Ok(())
    }

    /// Bulk price update from parallel slices
    pub fn set_current_prices(&mut self, symbols: &[String], prices: &[f64]) -> NisaResult<()> {
        if symbols.len() != prices.len() {
            return Err(NisaError::LengthMismatch(format!(
                "{} symbols but {} prices",
                symbols.len(),
                prices.len()
            )));
        }
        for (symbol, &price) in symbols.iter().zip(prices) {
            self.set_current_price(symbol, price)?;
        }
        Ok(())
    }

    pub fn current_price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn prices(&self) -> &HashMap<String, f64> {
        &self.prices
    }

    pub fn tax_year(&self) -> Option<i32> {
        self.tax_year
    }

    /// Whether a transaction falls inside the current tax-year window
    pub fn in_current_window(&self, tx: &Transaction) -> bool {
        match self.tax_year {
            Some(year) => tx.tax_year() == year,
            None => true,
        }
    }

    pub fn current_window(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions
            .iter()
            .filter(move |tx| self.in_current_window(tx))
    }

    /// Quota reuse carried into the current window by the last rollover
    pub fn carried_over(&self) -> QuotaAmounts {
        self.carried_over
    }

    pub fn released_lifetime(&self) -> QuotaAmounts {
        self.released_lifetime
    }

    /// Close the current window and open `year`.
    ///
    /// `released` is the pending quota reuse of the closing window. It becomes
    /// the new window's carry-over and is returned to the lifetime limit.
    pub fn roll_over_tax_year(
        &mut self,
        year: i32,
        released: QuotaAmounts,
    ) -> NisaResult<RolloverSummary> {
        if let Some(current) = self.tax_year {
            if year <= current {
                return Err(NisaError::TaxYearNotAdvanced {
                    current,
                    requested: year,
                });
            }
        }

        let closed = self.tax_year.replace(year);
        self.carried_over = released;
        self.released_lifetime.growth += released.growth;
        self.released_lifetime.accumulation += released.accumulation;

        tracing::info!(
            "Tax year rolled over {:?} -> {}: growth reuse {:.0}, accumulation reuse {:.0}",
            closed,
            year,
            released.growth,
            released.accumulation
        );

        Ok(RolloverSummary {
            closed_tax_year: closed,
            opened_tax_year: year,
            carried_over: released,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_ledger() -> TransactionLedger {
        TransactionLedger::from_transactions(vec![
            Transaction::buy("b1", "7203", "Toyota", 100, 2500.0, QuotaType::Growth, date(2024, 1, 10)),
            Transaction::buy("b2", "eMAXIS", "eMAXIS Slim", 10, 15000.0, QuotaType::Accumulation, date(2024, 1, 15)),
            Transaction::sell("s1", "7203", "Toyota", 40, 2600.0, QuotaType::Growth, date(2024, 2, 1), 4000.0),
        ])
    }

    #[test]
    fn test_append_and_symbol_lookup() {
        let ledger = sample_ledger();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.symbol_transactions("7203").count(), 2);
        assert_eq!(ledger.symbol_transactions("UNKNOWN").count(), 0);
        assert_eq!(ledger.symbols(), vec!["7203", "eMAXIS"]);
    }

    #[test]
    fn test_held_quantity() {
        let ledger = sample_ledger();
        assert_eq!(ledger.held_quantity("7203"), 60);
        assert_eq!(ledger.held_quantity("eMAXIS"), 10);
        assert_eq!(ledger.held_quantity("9999"), 0);
    }

    #[test]
    fn test_held_quantity_per_quota() {
        let mut ledger = sample_ledger();
        ledger.add_transaction(Transaction::buy(
            "b3", "7203", "Toyota", 20, 2550.0, QuotaType::Accumulation, date(2024, 3, 1),
        ));
        assert_eq!(ledger.held_quantity("7203"), 80);
        assert_eq!(ledger.held_quantity_in("7203", QuotaType::Growth), 60);
        assert_eq!(ledger.held_quantity_in("7203", QuotaType::Accumulation), 20);
        assert_eq!(ledger.held_quantity_in("9984", QuotaType::Growth), 0);
    }

    #[test]
    fn test_price_updates() {
        let mut ledger = TransactionLedger::new();
        ledger.set_current_price("7203", 2600.0).unwrap();
        ledger.set_current_price("7203", 2700.0).unwrap();
        assert_eq!(ledger.current_price("7203"), Some(2700.0));
        assert!(ledger.set_current_price("7203", 0.0).is_err());
        assert!(ledger.set_current_price("7203", f64::NAN).is_err());
    }

    #[test]
    fn test_bulk_prices_length_mismatch() {
        let mut ledger = TransactionLedger::new();
        let err = ledger
            .set_current_prices(&["7203".to_string()], &[1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, NisaError::LengthMismatch(_)));
    }

    #[test]
    fn test_rollover_window() {
        let mut ledger = sample_ledger();
        assert_eq!(ledger.current_window().count(), 3);

        let released = QuotaAmounts { growth: 104_000.0, accumulation: 0.0 };
        let summary = ledger.roll_over_tax_year(2025, released).unwrap();
        assert_eq!(summary.closed_tax_year, None);
        assert_eq!(summary.opened_tax_year, 2025);
        assert_eq!(ledger.carried_over().growth, 104_000.0);
        assert_eq!(ledger.current_window().count(), 0);

        let err = ledger.roll_over_tax_year(2025, QuotaAmounts::default()).unwrap_err();
        assert_eq!(err, NisaError::TaxYearNotAdvanced { current: 2025, requested: 2025 });

        ledger.roll_over_tax_year(2026, QuotaAmounts::default()).unwrap();
        assert_eq!(ledger.carried_over().growth, 0.0);
        assert_eq!(ledger.released_lifetime().growth, 104_000.0);
    }
}
