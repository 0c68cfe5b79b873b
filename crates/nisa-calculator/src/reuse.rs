//! Quota Reuse Engine
//!
//! Quota released by sales is not returned to the current year. It is
//! reported as pending and only becomes usable after an explicit rollover.

use nisa_core::{QuotaAmounts, Transaction, TransactionLedger};

use crate::models::QuotaReuse;

pub struct QuotaReuseEngine;

impl QuotaReuseEngine {
    /// Σ tax_free_amount of sells in the current window, per quota type
    pub fn pending(ledger: &TransactionLedger) -> QuotaAmounts {
        let mut released = QuotaAmounts::default();
        for sell in ledger.current_window().filter_map(Transaction::as_sell) {
            released.add(sell.trade.quota_type, sell.tax_free_amount);
        }
        released
    }

    pub fn calculate(ledger: &TransactionLedger) -> QuotaReuse {
        let pending = Self::pending(ledger);
        QuotaReuse {
            growth_available: pending.growth,
            accumulation_available: pending.accumulation,
            next_year_available: pending.total(),
        }
    }
}
