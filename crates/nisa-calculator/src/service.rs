//! Shared NISA calculator
//!
//! Single-writer wrapper for use behind an async API layer. Mutations take
//! the write lock; reads compute against the state seen under one read lock.

use std::sync::Arc;

use nisa_core::{NisaResult, RolloverSummary, Transaction, TransactionDraft, TransactionLedger};
use tokio::sync::RwLock;

use crate::calculator::NisaCalculator;
use crate::models::{
    Alert, NisaReport, NisaStatistics, OptimizationRecommendation, Portfolio, QuotaStatus,
    TaxCalculation, ValidationResult,
};

#[derive(Clone, Default)]
pub struct SharedNisaCalculator {
    inner: Arc<RwLock<NisaCalculator>>,
}

impl SharedNisaCalculator {
    pub fn new(calculator: NisaCalculator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(calculator)),
        }
    }

    pub async fn add_transaction(&self, tx: Transaction) {
        self.inner.write().await.add_transaction(tx);
    }

    /// Validate and append under one write lock, so no other append can
    /// slip in between the check and the insert
    pub async fn submit_transaction(&self, draft: TransactionDraft) -> NisaResult<ValidationResult> {
        self.inner.write().await.submit_transaction(draft)
    }

    pub async fn validate_transaction(&self, draft: &TransactionDraft) -> ValidationResult {
        self.inner.read().await.validate_transaction(draft)
    }

    pub async fn set_current_price(&self, symbol: &str, price: f64) -> NisaResult<()> {
        self.inner.write().await.set_current_price(symbol, price)
    }

    pub async fn roll_over_tax_year(&self, year: i32) -> NisaResult<RolloverSummary> {
        self.inner.write().await.roll_over_tax_year(year)
    }

    pub async fn quota_status(&self) -> QuotaStatus {
        self.inner.read().await.calculate_quota_status()
    }

    pub async fn portfolio(&self) -> Portfolio {
        self.inner.read().await.calculate_portfolio()
    }

    pub async fn optimization(&self) -> OptimizationRecommendation {
        self.inner.read().await.calculate_optimization()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.inner.read().await.generate_alerts()
    }

    pub async fn tax(&self) -> TaxCalculation {
        self.inner.read().await.calculate_tax()
    }

    pub async fn statistics(&self) -> NisaStatistics {
        self.inner.read().await.calculate_statistics()
    }

    pub async fn report(&self) -> NisaReport {
        self.inner.read().await.report()
    }

    /// Copy of the ledger for work outside the lock
    pub async fn snapshot(&self) -> TransactionLedger {
        self.inner.read().await.ledger().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nisa_core::QuotaType;

    fn buy(id: usize) -> Transaction {
        Transaction::buy(
            format!("b{}", id),
            "1306",
            "TOPIX ETF",
            10,
            2000.0,
            QuotaType::Growth,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_serialized() {
        let shared = SharedNisaCalculator::default();
        let mut handles = Vec::new();
        for i in 0..50 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move { shared.add_transaction(buy(i)).await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = shared.snapshot().await;
        assert_eq!(snapshot.len(), 50);
        assert_eq!(shared.quota_status().await.growth.used_amount, 1_000_000.0);
    }

    #[tokio::test]
    async fn test_concurrent_submits_respect_quota() {
        let shared = SharedNisaCalculator::default();
        let mut handles = Vec::new();
        // 20 × 200,000 requested against a 2,400,000 annual limit
        for i in 0..20 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                let draft = TransactionDraft {
                    id: format!("d{}", i),
                    kind: "BUY".to_string(),
                    symbol: "1306".to_string(),
                    symbol_name: "TOPIX ETF".to_string(),
                    quantity: 100,
                    price: 2000.0,
                    amount: None,
                    quota_type: "GROWTH".to_string(),
                    transaction_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                    profit_loss: None,
                    tax_free_amount: None,
                };
                shared.submit_transaction(draft).await.unwrap().is_valid
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 12);
        let status = shared.quota_status().await;
        assert_eq!(status.growth.used_amount, 2_400_000.0);
        assert_eq!(status.growth.available_amount, 0.0);
    }

    #[tokio::test]
    async fn test_rollover_through_service() {
        let shared = SharedNisaCalculator::default();
        shared.add_transaction(buy(1)).await;
        let summary = shared.roll_over_tax_year(2025).await.unwrap();
        assert_eq!(summary.opened_tax_year, 2025);
        assert!(shared.roll_over_tax_year(2024).await.is_err());
        assert_eq!(shared.quota_status().await.tax_year, Some(2025));
    }
}
