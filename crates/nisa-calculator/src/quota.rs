//! Quota Accountant
//!
//! Annual and lifetime usage per quota bucket, and business-rule validation
//! of proposed transactions.

use chrono::Datelike;
use nisa_core::{QuotaType, Transaction, TransactionDraft, TransactionKind, TransactionLedger};

use crate::models::{QuotaStatus, QuotaUsage, ValidationResult};
use crate::portfolio::PortfolioValuator;
use crate::reuse::QuotaReuseEngine;
use crate::settings::AlertThresholds;
use crate::shared_math::{approx_equal, percent_of};

/// Allowed gap between `amount` and `quantity × price`, in yen
pub const AMOUNT_TOLERANCE: f64 = 1.0;

pub struct QuotaAccountant;

impl QuotaAccountant {
    /// Usage of one bucket for the ledger's current tax-year window
    pub fn usage(ledger: &TransactionLedger, quota_type: QuotaType) -> QuotaUsage {
        let mut used_amount = 0.0;
        let mut lifetime_bought = 0.0;

        for tx in ledger.transactions() {
            if tx.quota_type() != quota_type {
                continue;
            }
            let in_window = ledger.in_current_window(tx);
            match tx {
                Transaction::Buy(_) => {
                    lifetime_bought += tx.amount();
                    if in_window {
                        used_amount += tx.amount();
                    }
                }
                Transaction::Sell(_) => {
                    if in_window {
                        used_amount -= tx.amount();
                    }
                }
            }
        }

        let annual_limit = quota_type.annual_limit();
        let carried_over = ledger.carried_over().get(quota_type);
        let lifetime_limit = quota_type.tax_free_limit();
        let lifetime_used_amount = lifetime_bought - ledger.released_lifetime().get(quota_type);

        QuotaUsage {
            quota_type,
            annual_limit,
            carried_over,
            used_amount,
            available_amount: annual_limit + carried_over - used_amount,
            utilization_rate: percent_of(used_amount, annual_limit),
            lifetime_limit,
            lifetime_used_amount,
            lifetime_available_amount: lifetime_limit - lifetime_used_amount,
            lifetime_utilization_rate: percent_of(lifetime_used_amount, lifetime_limit),
        }
    }

    pub fn calculate_quota_status(ledger: &TransactionLedger) -> QuotaStatus {
        let growth = Self::usage(ledger, QuotaType::Growth);
        let accumulation = Self::usage(ledger, QuotaType::Accumulation);

        for usage in [&growth, &accumulation] {
            if usage.used_amount > usage.annual_limit + usage.carried_over {
                tracing::warn!(
                    "{} usage {:.0} exceeds the annual limit {:.0}",
                    usage.quota_type,
                    usage.used_amount,
                    usage.annual_limit
                );
            }
        }

        QuotaStatus {
            tax_year: ledger.tax_year(),
            growth,
            accumulation,
            quota_reuse: QuotaReuseEngine::calculate(ledger),
        }
    }

    /// Check a proposed transaction against the current ledger.
    ///
    /// Every failing rule is reported; nothing short-circuits.
    pub fn validate_transaction(
        ledger: &TransactionLedger,
        draft: &TransactionDraft,
        thresholds: &AlertThresholds,
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let quota_type = match draft.quota_type.parse::<QuotaType>() {
            Ok(q) => Some(q),
            Err(_) => {
                errors.push(format!(
                    "Invalid quota type {:?}: expected GROWTH or ACCUMULATION",
                    draft.quota_type
                ));
                None
            }
        };
        let kind = match draft.kind.parse::<TransactionKind>() {
            Ok(k) => Some(k),
            Err(_) => {
                errors.push(format!(
                    "Invalid transaction type {:?}: expected BUY or SELL",
                    draft.kind
                ));
                None
            }
        };

        let symbol = draft.symbol.trim();
        if symbol.is_empty() {
            errors.push("Symbol is required".to_string());
        }
        let quantity_ok = draft.quantity > 0;
        if !quantity_ok {
            errors.push(format!("Quantity must be greater than 0, got {}", draft.quantity));
        }
        let price_ok = draft.price.is_finite() && draft.price > 0.0;
        if !price_ok {
            errors.push(format!("Price must be greater than 0, got {}", draft.price));
        }

        let amount = draft.effective_amount();
        let amount_ok = amount.is_finite() && amount > 0.0;
        if !amount_ok {
            errors.push(format!("Amount must be greater than 0, got {}", amount));
        } else if quantity_ok && price_ok {
            let expected = draft.quantity as f64 * draft.price;
            if !approx_equal(amount, expected, AMOUNT_TOLERANCE) {
                errors.push(format!(
                    "Amount {:.0} does not match quantity × price ({:.0})",
                    amount, expected
                ));
            }
        }

        if let Some(year) = ledger.tax_year() {
            if draft.transaction_date.year() != year {
                warnings.push(format!(
                    "Transaction date {} is outside the current tax year {}",
                    draft.transaction_date, year
                ));
            }
        }

        match (kind, quota_type) {
            (Some(TransactionKind::Buy), Some(quota_type)) if amount_ok => {
                let usage = Self::usage(ledger, quota_type);

                if amount > usage.available_amount {
                    errors.push(format!(
                        "Annual available amount exceeded for the {}: requested {:.0} yen, available {:.0} yen",
                        quota_type, amount, usage.available_amount
                    ));
                } else {
                    let projected_rate = percent_of(usage.used_amount + amount, usage.annual_limit);
                    if projected_rate >= thresholds.warning_rate {
                        warnings.push(format!(
                            "The {} would reach {:.1}% of its annual limit",
                            quota_type, projected_rate
                        ));
                    }
                }

                if usage.lifetime_used_amount + amount > usage.lifetime_limit {
                    errors.push(format!(
                        "Lifetime tax-free limit exceeded for the {}: requested {:.0} yen, remaining {:.0} yen",
                        quota_type, amount, usage.lifetime_available_amount
                    ));
                } else {
                    let projected_rate =
                        percent_of(usage.lifetime_used_amount + amount, usage.lifetime_limit);
                    if projected_rate >= thresholds.lifetime_warning_rate {
                        warnings.push(format!(
                            "The {} would reach {:.1}% of its lifetime limit",
                            quota_type, projected_rate
                        ));
                    }
                }
            }
            (Some(TransactionKind::Sell), _) if !symbol.is_empty() => {
                let held = ledger.held_quantity(symbol);
                if quantity_ok && draft.quantity > held {
                    errors.push(format!(
                        "Sell quantity {} exceeds held quantity {} for {}",
                        draft.quantity, held, symbol
                    ));
                } else if let Some(quota_type) = quota_type {
                    // a sale releases quota only from the bucket the shares were bought in
                    let held_in_quota = ledger.held_quantity_in(symbol, quota_type);
                    if quantity_ok && draft.quantity > held_in_quota {
                        errors.push(format!(
                            "Sell quantity {} exceeds the {} shares of {} held under the {}",
                            draft.quantity, held_in_quota, symbol, quota_type
                        ));
                    }
                }

                if let Some(tax_free) = draft.tax_free_amount {
                    if amount_ok && tax_free > amount + AMOUNT_TOLERANCE {
                        warnings.push(format!(
                            "Tax-free amount {:.0} is larger than the sale amount {:.0}",
                            tax_free, amount
                        ));
                    }
                }

                if let (Some(reported), Some(holding)) =
                    (draft.profit_loss, PortfolioValuator::holding(ledger, symbol))
                {
                    if quantity_ok && amount_ok && holding.quantity > 0 {
                        let expected = amount - draft.quantity as f64 * holding.average_price;
                        if !approx_equal(reported, expected, AMOUNT_TOLERANCE) {
                            warnings.push(format!(
                                "Reported profit/loss {:.0} differs from the average-cost result {:.0}",
                                reported, expected
                            ));
                        }
                    }
                }
            }
            _ => {}
        }

        ValidationResult::new(errors, warnings)
    }
}
