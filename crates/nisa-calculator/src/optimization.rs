//! Optimization Advisor
//!
//! Suggests how much of each remaining quota to invest. Priority falls as
//! utilization rises; the sector mix of the portfolio feeds a risk summary.

use nisa_core::QuotaType;

use crate::models::{
    OptimizationRecommendation, Portfolio, Priority, QuotaRecommendation, QuotaStatus,
    QuotaUsage, RiskAnalysis, RiskLevel,
};
use crate::portfolio::PortfolioValuator;
use crate::settings::OptimizationThresholds;
use crate::shared_math::{herfindahl_index, normalize};

pub struct OptimizationAdvisor {
    thresholds: OptimizationThresholds,
}

impl OptimizationAdvisor {
    pub fn new(thresholds: OptimizationThresholds) -> Self {
        Self { thresholds }
    }

    /// Priority band for a utilization rate
    pub fn priority_for(&self, utilization_rate: f64) -> Priority {
        if utilization_rate < self.thresholds.low_water_rate {
            Priority::High
        } else if utilization_rate >= self.thresholds.high_water_rate {
            Priority::Low
        } else {
            Priority::Medium
        }
    }

    fn recommend(&self, usage: &QuotaUsage) -> QuotaRecommendation {
        let available = usage.available_amount.max(0.0);
        let priority = self.priority_for(usage.utilization_rate);

        let (suggested_amount, reason) = match priority {
            Priority::High => (
                available,
                format!(
                    "Only {:.1}% of the {} is used; investing the remaining {:.0} yen maximizes tax-free growth",
                    usage.utilization_rate, usage.quota_type, available
                ),
            ),
            Priority::Medium => (
                available * self.thresholds.medium_fraction,
                format!(
                    "The {} is {:.1}% used; spread the remaining quota over the rest of the year",
                    usage.quota_type, usage.utilization_rate
                ),
            ),
            Priority::Low => {
                let cap = usage.annual_limit * self.thresholds.conservative_fraction;
                (
                    (available * self.thresholds.conservative_fraction).min(cap),
                    format!(
                        "The {} is {:.1}% used; keep new purchases small and conserve the remaining quota",
                        usage.quota_type, usage.utilization_rate
                    ),
                )
            }
        };

        QuotaRecommendation {
            quota_type: usage.quota_type,
            utilization_rate: usage.utilization_rate,
            available_amount: usage.available_amount,
            suggested_amount,
            priority,
            reason,
        }
    }

    /// Sector concentration of current holdings
    pub fn risk_analysis(portfolio: &Portfolio) -> RiskAnalysis {
        let sector_concentration = PortfolioValuator::sector_weights(portfolio);
        if sector_concentration.is_empty() {
            return RiskAnalysis {
                diversification_score: 0.0,
                sector_concentration,
                largest_sector: None,
                concentration_risk: RiskLevel::Low,
            };
        }

        let values: Vec<f64> = sector_concentration.iter().map(|s| s.value).collect();
        let weights = normalize(&values);
        let diversification_score = (1.0 - herfindahl_index(&weights)) * 100.0;
        let largest_sector = sector_concentration.first().cloned();
        let concentration_risk = RiskLevel::from_score(
            largest_sector.as_ref().map(|s| s.weight).unwrap_or(0.0),
        );

        RiskAnalysis {
            diversification_score,
            sector_concentration,
            largest_sector,
            concentration_risk,
        }
    }

    pub fn calculate_optimization(
        &self,
        status: &QuotaStatus,
        portfolio: &Portfolio,
    ) -> OptimizationRecommendation {
        let growth = self.recommend(status.usage(QuotaType::Growth));
        let accumulation = self.recommend(status.usage(QuotaType::Accumulation));

        OptimizationRecommendation {
            total_suggested_amount: growth.suggested_amount + accumulation.suggested_amount,
            growth,
            accumulation,
            risk_analysis: Self::risk_analysis(portfolio),
        }
    }
}

impl Default for OptimizationAdvisor {
    fn default() -> Self {
        Self::new(OptimizationThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::QuotaAccountant;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use nisa_core::{Transaction, TransactionLedger};
    use std::collections::HashMap;

    fn growth_buy(qty: u64, price: f64) -> Transaction {
        Transaction::buy(
            "b1",
            "1306",
            "TOPIX ETF",
            qty,
            price,
            QuotaType::Growth,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )
    }

    fn recommend_growth(transactions: Vec<Transaction>) -> QuotaRecommendation {
        let ledger = TransactionLedger::from_transactions(transactions);
        let status = QuotaAccountant::calculate_quota_status(&ledger);
        let portfolio = PortfolioValuator::calculate_portfolio(&ledger, &HashMap::new());
        OptimizationAdvisor::default()
            .calculate_optimization(&status, &portfolio)
            .growth
    }

    #[test]
    fn test_low_usage_high_priority() {
        let rec = recommend_growth(vec![]);
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.suggested_amount, 2_400_000.0);
    }

    #[test]
    fn test_medium_band() {
        // 1,440,000 / 2,400,000 = 60%
        let rec = recommend_growth(vec![growth_buy(1000, 1440.0)]);
        assert_eq!(rec.priority, Priority::Medium);
        assert_abs_diff_eq!(rec.suggested_amount, 480_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_high_usage_low_priority() {
        // 2,000,000 / 2,400,000 = 83.3%
        let rec = recommend_growth(vec![growth_buy(1000, 2000.0)]);
        assert_eq!(rec.priority, Priority::Low);
        assert!(rec.suggested_amount < 500_000.0);
        assert_abs_diff_eq!(rec.suggested_amount, 100_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_priority_monotonic_in_utilization() {
        let advisor = OptimizationAdvisor::default();
        let mut last_priority = Priority::High;
        let mut last_suggested = f64::INFINITY;
        for used in (0..=24).map(|i| i as f64 * 100_000.0) {
            let rec = recommend_growth(if used > 0.0 { vec![growth_buy(1000, used / 1000.0)] } else { vec![] });
            assert!(rec.priority <= last_priority);
            assert!(rec.suggested_amount <= last_suggested);
            assert_eq!(rec.priority, advisor.priority_for(rec.utilization_rate));
            last_priority = rec.priority;
            last_suggested = rec.suggested_amount;
        }
    }

    #[test]
    fn test_over_limit_suggests_nothing() {
        let rec = recommend_growth(vec![growth_buy(1000, 3000.0)]);
        assert_eq!(rec.priority, Priority::Low);
        assert_eq!(rec.suggested_amount, 0.0);
        assert_eq!(rec.available_amount, -600_000.0);
    }

    #[test]
    fn test_risk_analysis_single_sector() {
        let ledger = TransactionLedger::from_transactions(vec![growth_buy(100, 2000.0)]);
        let portfolio = PortfolioValuator::calculate_portfolio(
            &ledger,
            &HashMap::from([("1306".to_string(), "Index".to_string())]),
        );
        let risk = OptimizationAdvisor::risk_analysis(&portfolio);
        assert_abs_diff_eq!(risk.diversification_score, 0.0, epsilon = 1e-9);
        assert_eq!(risk.concentration_risk, RiskLevel::High);
        assert_eq!(risk.largest_sector.unwrap().sector, "Index");
    }

    #[test]
    fn test_risk_analysis_empty() {
        let risk = OptimizationAdvisor::risk_analysis(&Portfolio::default());
        assert_eq!(risk.diversification_score, 0.0);
        assert!(risk.largest_sector.is_none());
    }
}
