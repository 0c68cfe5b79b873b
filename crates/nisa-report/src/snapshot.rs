//! Ledger snapshot import
//!
//! A snapshot is the JSON document the report binary reads:
//! `{ "settings"?, "transactions": [...], "prices": {...}, "tax_year"? }`.
//! Transactions are historical, so failed validation is logged and the
//! transaction is still imported. Only drafts that cannot become a typed
//! transaction at all are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;
use nisa_calculator::{NisaCalculator, NisaSettings};
use nisa_core::TransactionDraft;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerSnapshot {
    /// Overrides the environment settings when present
    #[serde(default)]
    pub settings: Option<NisaSettings>,
    #[serde(default)]
    pub transactions: Vec<TransactionDraft>,
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,
    /// Tax year to report on; enables windowed quota accounting
    #[serde(default)]
    pub tax_year: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Imported despite validation errors
    pub flagged: usize,
    pub skipped: usize,
}

impl LedgerSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Replay the snapshot into a calculator.
    ///
    /// With a `tax_year`, transactions are replayed in date order and the
    /// ledger rolls over at each year boundary up to `tax_year`, so quota
    /// released by sells carries into the following year.
    pub fn into_calculator(self, env_settings: NisaSettings) -> Result<(NisaCalculator, ImportSummary)> {
        let Self {
            settings,
            mut transactions,
            prices,
            tax_year,
        } = self;

        let settings = settings.unwrap_or(env_settings);
        settings.validate().context("Invalid settings")?;

        let mut calc = NisaCalculator::new(settings);
        let mut summary = ImportSummary::default();

        // stable: same-day transactions keep their file order
        transactions.sort_by_key(|draft| draft.transaction_date);

        for draft in transactions {
            if let Some(target) = tax_year {
                let year = draft.transaction_date.year();
                if year <= target {
                    advance_to(&mut calc, year)?;
                }
            }

            let result = calc.validate_transaction(&draft);
            for warning in &result.warnings {
                tracing::warn!("Transaction {}: {}", draft.id, warning);
            }
            if !result.is_valid {
                tracing::warn!(
                    "Transaction {} failed validation: {}",
                    draft.id,
                    result.errors.join("; ")
                );
            }

            let id = draft.id.clone();
            match draft.into_transaction() {
                Ok(tx) => {
                    calc.add_transaction(tx);
                    summary.imported += 1;
                    if !result.is_valid {
                        summary.flagged += 1;
                    }
                }
                Err(e) => {
                    tracing::error!("Skipping transaction {}: {}", id, e);
                    summary.skipped += 1;
                }
            }
        }

        if let Some(target) = tax_year {
            advance_to(&mut calc, target)?;
        }

        for (symbol, price) in prices {
            calc.set_current_price(&symbol, price)
                .with_context(|| format!("Invalid price in snapshot for {}", symbol))?;
        }

        Ok((calc, summary))
    }
}

fn advance_to(calc: &mut NisaCalculator, year: i32) -> Result<()> {
    match calc.ledger().tax_year() {
        Some(current) if current >= year => Ok(()),
        _ => {
            calc.roll_over_tax_year(year)?;
            Ok(())
        }
    }
}
