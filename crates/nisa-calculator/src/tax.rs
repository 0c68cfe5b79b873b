//! Tax Estimator
//!
//! Estimates what holding the portfolio inside NISA saves compared to a
//! fully taxable account.

use nisa_core::QuotaType;

use crate::models::{Portfolio, QuotaStatus, TaxCalculation};
use crate::settings::DEFAULT_TAX_RATE;

pub struct TaxEstimator {
    tax_rate: f64,
}

impl TaxEstimator {
    pub fn new(tax_rate: f64) -> Self {
        Self { tax_rate }
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    pub fn calculate_tax(&self, status: &QuotaStatus, portfolio: &Portfolio) -> TaxCalculation {
        let reuse = &status.quota_reuse;
        let growth_next_year_available =
            QuotaType::Growth.annual_limit() + reuse.growth_available;
        let accumulation_next_year_available =
            QuotaType::Accumulation.annual_limit() + reuse.accumulation_available;

        TaxCalculation {
            tax_year: status.tax_year,
            growth_used: status.growth.used_amount,
            accumulation_used: status.accumulation.used_amount,
            growth_next_year_available,
            accumulation_next_year_available,
            total_next_year_available: growth_next_year_available
                + accumulation_next_year_available,
            realized_profit_loss: portfolio.realized_profit_loss,
            tax_free_profit_loss: portfolio.tax_free_profit_loss,
            unrealized_profit_loss: portfolio.unrealized_profit_loss,
            assumed_tax_rate: self.tax_rate,
            estimated_tax_savings: portfolio.tax_free_profit_loss * self.tax_rate,
            potential_tax_savings: portfolio.unrealized_profit_loss.max(0.0) * self.tax_rate,
        }
    }
}

impl Default for TaxEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_TAX_RATE)
    }
}
