use nisa_core::{NisaResult, RolloverSummary, Transaction, TransactionDraft, TransactionLedger};

use crate::alerts::AlertGenerator;
use crate::models::{
    Alert, NisaReport, NisaStatistics, OptimizationRecommendation, Portfolio, QuotaStatus,
    TaxCalculation, ValidationResult,
};
use crate::optimization::OptimizationAdvisor;
use crate::portfolio::PortfolioValuator;
use crate::quota::QuotaAccountant;
use crate::reuse::QuotaReuseEngine;
use crate::settings::NisaSettings;
use crate::statistics::StatisticsAggregator;
use crate::tax::TaxEstimator;

/// One ledger plus the configuration its calculators read.
///
/// Every `calculate_*` call recomputes from the current ledger; nothing is
/// cached between calls.
#[derive(Debug, Clone, Default)]
pub struct NisaCalculator {
    ledger: TransactionLedger,
    settings: NisaSettings,
}

impl NisaCalculator {
    pub fn new(settings: NisaSettings) -> Self {
        Self {
            ledger: TransactionLedger::new(),
            settings,
        }
    }

    pub fn with_ledger(ledger: TransactionLedger, settings: NisaSettings) -> Self {
        Self { ledger, settings }
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &NisaSettings {
        &self.settings
    }

    /// Append without validation (historical import)
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.ledger.add_transaction(tx);
    }

    pub fn validate_transaction(&self, draft: &TransactionDraft) -> ValidationResult {
        QuotaAccountant::validate_transaction(&self.ledger, draft, &self.settings.alerts)
    }

    /// Validate a draft and append it only when it passes
    pub fn submit_transaction(&mut self, draft: TransactionDraft) -> NisaResult<ValidationResult> {
        let result = self.validate_transaction(&draft);
        if result.is_valid {
            let tx = draft.into_transaction()?;
            self.ledger.add_transaction(tx);
        } else {
            tracing::info!(
                "Rejected transaction {}: {}",
                draft.id,
                result.errors.join("; ")
            );
        }
        Ok(result)
    }

    pub fn set_current_price(&mut self, symbol: &str, price: f64) -> NisaResult<()> {
        self.ledger.set_current_price(symbol, price)
    }

    pub fn set_sector(&mut self, symbol: impl Into<String>, sector: impl Into<String>) {
        self.settings.sectors.insert(symbol.into(), sector.into());
    }

    /// Close the current tax year and carry its released quota into `year`
    pub fn roll_over_tax_year(&mut self, year: i32) -> NisaResult<RolloverSummary> {
        let released = QuotaReuseEngine::pending(&self.ledger);
        self.ledger.roll_over_tax_year(year, released)
    }

    pub fn calculate_quota_status(&self) -> QuotaStatus {
        QuotaAccountant::calculate_quota_status(&self.ledger)
    }

    pub fn calculate_portfolio(&self) -> Portfolio {
        PortfolioValuator::calculate_portfolio(&self.ledger, &self.settings.sectors)
    }

    pub fn calculate_optimization(&self) -> OptimizationRecommendation {
        OptimizationAdvisor::new(self.settings.optimization.clone())
            .calculate_optimization(&self.calculate_quota_status(), &self.calculate_portfolio())
    }

    pub fn generate_alerts(&self) -> Vec<Alert> {
        AlertGenerator::new(self.settings.alerts.clone())
            .generate_alerts(&self.calculate_quota_status())
    }

    pub fn calculate_tax(&self) -> TaxCalculation {
        TaxEstimator::new(self.settings.assumed_tax_rate)
            .calculate_tax(&self.calculate_quota_status(), &self.calculate_portfolio())
    }

    pub fn calculate_statistics(&self) -> NisaStatistics {
        StatisticsAggregator::calculate_statistics(&self.calculate_portfolio())
    }

    /// All outputs from a single pass over the ledger
    pub fn report(&self) -> NisaReport {
        let quota_status = self.calculate_quota_status();
        let portfolio = self.calculate_portfolio();

        NisaReport {
            optimization: OptimizationAdvisor::new(self.settings.optimization.clone())
                .calculate_optimization(&quota_status, &portfolio),
            alerts: AlertGenerator::new(self.settings.alerts.clone())
                .generate_alerts(&quota_status),
            tax: TaxEstimator::new(self.settings.assumed_tax_rate)
                .calculate_tax(&quota_status, &portfolio),
            statistics: StatisticsAggregator::calculate_statistics(&portfolio),
            quota_status,
            portfolio,
        }
    }
}
