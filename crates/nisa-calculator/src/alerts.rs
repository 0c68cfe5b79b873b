//! Alert Generator
//!
//! Threshold-crossing warnings derived from quota usage. Alerts carry no
//! state between calls; read/dismiss bookkeeping belongs to the caller.

use nisa_core::QuotaType;

use crate::models::{Alert, AlertType, QuotaStatus};
use crate::settings::AlertThresholds;

pub struct AlertGenerator {
    thresholds: AlertThresholds,
}

impl AlertGenerator {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    pub fn generate_alerts(&self, status: &QuotaStatus) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for quota_type in QuotaType::ALL {
            let usage = status.usage(quota_type);
            let code = quota_type.code().to_lowercase();
            let rate = usage.utilization_rate;
            let remaining = usage.available_amount.max(0.0);

            if rate >= self.thresholds.critical_rate {
                alerts.push(Alert {
                    id: format!("{}-annual-critical", code),
                    alert_type: AlertType::Critical,
                    quota_type,
                    current_usage: rate,
                    threshold: self.thresholds.critical_rate,
                    message: format!(
                        "The {} has used {:.1}% of its annual limit",
                        quota_type, rate
                    ),
                    recommended_action: format!(
                        "Hold further purchases in the {}; {:.0} yen remains this year",
                        quota_type, remaining
                    ),
                });
            } else if rate >= self.thresholds.warning_rate {
                alerts.push(Alert {
                    id: format!("{}-annual-warning", code),
                    alert_type: AlertType::Warning,
                    quota_type,
                    current_usage: rate,
                    threshold: self.thresholds.warning_rate,
                    message: format!(
                        "The {} is approaching its annual limit ({:.1}% used)",
                        quota_type, rate
                    ),
                    recommended_action: format!(
                        "Plan the remaining {:.0} yen carefully before year end",
                        remaining
                    ),
                });
            }

            let lifetime_rate = usage.lifetime_utilization_rate;
            if lifetime_rate >= self.thresholds.lifetime_warning_rate {
                alerts.push(Alert {
                    id: format!("{}-lifetime-warning", code),
                    alert_type: AlertType::Warning,
                    quota_type,
                    current_usage: lifetime_rate,
                    threshold: self.thresholds.lifetime_warning_rate,
                    message: format!(
                        "The {} has used {:.1}% of its lifetime tax-free limit",
                        quota_type, lifetime_rate
                    ),
                    recommended_action: format!(
                        "Only {:.0} yen of lifetime capacity remains; consider selling to free quota for future years",
                        usage.lifetime_available_amount.max(0.0)
                    ),
                });
            }

            let pending = status.quota_reuse.get(quota_type);
            if pending > 0.0 {
                alerts.push(Alert {
                    id: format!("{}-reuse-info", code),
                    alert_type: AlertType::Info,
                    quota_type,
                    current_usage: rate,
                    threshold: 0.0,
                    message: format!(
                        "{:.0} yen of {} released by sales becomes available from the next tax year",
                        pending, quota_type
                    ),
                    recommended_action: "Include the released quota when planning next year's purchases"
                        .to_string(),
                });
            }
        }

        tracing::debug!("Generated {} NISA alerts", alerts.len());
        alerts
    }
}

impl Default for AlertGenerator {
    fn default() -> Self {
        Self::new(AlertThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::QuotaAccountant;
    use chrono::NaiveDate;
    use nisa_core::{Transaction, TransactionLedger};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn status_for(transactions: Vec<Transaction>) -> QuotaStatus {
        QuotaAccountant::calculate_quota_status(&TransactionLedger::from_transactions(transactions))
    }

    #[test]
    fn test_no_alerts_when_empty() {
        let alerts = AlertGenerator::default().generate_alerts(&status_for(vec![]));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_no_alerts_at_low_usage() {
        let status = status_for(vec![Transaction::buy(
            "b1", "7203", "Toyota", 100, 2500.0, QuotaType::Growth, date(1, 10),
        )]);
        assert!(AlertGenerator::default().generate_alerts(&status).is_empty());
    }

    #[test]
    fn test_warning_band() {
        // 2,000,000 / 2,400,000 = 83.3%
        let status = status_for(vec![Transaction::buy(
            "b1", "1306", "TOPIX ETF", 1000, 2000.0, QuotaType::Growth, date(1, 10),
        )]);
        let alerts = AlertGenerator::default().generate_alerts(&status);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
        assert_eq!(alerts[0].id, "growth-annual-warning");
        assert_eq!(alerts[0].threshold, 80.0);
    }

    #[test]
    fn test_critical_band() {
        // 380,000 / 400,000 = 95%
        let status = status_for(vec![Transaction::buy(
            "b1", "FUND", "Index Fund", 19, 20_000.0, QuotaType::Accumulation, date(1, 10),
        )]);
        let alerts = AlertGenerator::default().generate_alerts(&status);
        let critical: Vec<&Alert> = alerts
            .iter()
            .filter(|a| a.alert_type == AlertType::Critical)
            .collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].quota_type, QuotaType::Accumulation);
        assert!(critical[0].message.contains("accumulation quota"));
        assert!(critical[0].recommended_action.contains("20000 yen"));
    }

    #[test]
    fn test_reuse_info_alert() {
        let status = status_for(vec![
            Transaction::buy("b1", "7203", "Toyota", 100, 2500.0, QuotaType::Growth, date(1, 10)),
            Transaction::sell("s1", "7203", "Toyota", 50, 2600.0, QuotaType::Growth, date(2, 10), 5000.0),
        ]);
        let alerts = AlertGenerator::default().generate_alerts(&status);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Info);
        assert_eq!(alerts[0].id, "growth-reuse-info");
    }

    #[test]
    fn test_custom_thresholds() {
        let status = status_for(vec![Transaction::buy(
            "b1", "1306", "TOPIX ETF", 1000, 1500.0, QuotaType::Growth, date(1, 10),
        )]);
        let generator = AlertGenerator::new(AlertThresholds {
            warning_rate: 50.0,
            critical_rate: 60.0,
            lifetime_warning_rate: 90.0,
        });
        let alerts = generator.generate_alerts(&status);
        assert_eq!(alerts[0].alert_type, AlertType::Critical);
    }

    #[test]
    fn test_lifetime_warning_alert() {
        let mut ledger = TransactionLedger::new();
        for (i, year) in (2019..2023).enumerate() {
            ledger.add_transaction(Transaction::buy(
                format!("b{}", i),
                "FUND",
                "Index Fund",
                20,
                20_000.0,
                QuotaType::Accumulation,
                NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
            ));
        }
        ledger.add_transaction(Transaction::buy(
            "b4", "FUND", "Index Fund", 15, 20_000.0, QuotaType::Accumulation,
            NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
        ));
        ledger
            .roll_over_tax_year(2024, nisa_core::QuotaAmounts::default())
            .unwrap();

        // 1,900,000 of 2,000,000 lifetime, nothing this year
        let alerts =
            AlertGenerator::default().generate_alerts(&QuotaAccountant::calculate_quota_status(&ledger));
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.id, "accumulation-lifetime-warning");
        assert_eq!(alert.alert_type, AlertType::Warning);
        assert_eq!(alert.quota_type, QuotaType::Accumulation);
        approx::assert_abs_diff_eq!(alert.current_usage, 95.0, epsilon = 1e-9);
        assert_eq!(alert.threshold, 90.0);
    }
}
