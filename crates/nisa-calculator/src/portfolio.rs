//! Portfolio Valuator
//!
//! Folds the ledger per symbol into weighted-average-cost positions and
//! values them against externally supplied prices.

use std::collections::{BTreeMap, HashMap};

use nisa_core::{QuotaType, Transaction, TransactionLedger};

use crate::models::{Portfolio, Position, SectorWeight};
use crate::shared_math::percent_of;

/// Sector label for symbols missing from the sector map
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// Running state of one symbol while folding the ledger
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Holding {
    pub symbol_name: String,
    pub quota_type: QuotaType,
    pub quantity: i64,
    pub average_price: f64,
    pub realized_profit_loss: f64,
}

pub struct PortfolioValuator;

impl PortfolioValuator {
    /// Fold one symbol's transactions in ledger order.
    ///
    /// A buy re-weights the average price; a sell only reduces quantity.
    pub(crate) fn holding(ledger: &TransactionLedger, symbol: &str) -> Option<Holding> {
        let mut holding: Option<Holding> = None;

        for tx in ledger.symbol_transactions(symbol) {
            let trade = tx.trade();
            let h = holding.get_or_insert_with(|| Holding {
                symbol_name: trade.symbol_name.clone(),
                quota_type: trade.quota_type,
                quantity: 0,
                average_price: 0.0,
                realized_profit_loss: 0.0,
            });

            match tx {
                Transaction::Buy(_) => {
                    let old_qty = h.quantity.max(0) as f64;
                    let buy_qty = trade.quantity as f64;
                    let new_qty = old_qty + buy_qty;
                    if new_qty > 0.0 {
                        h.average_price =
                            (old_qty * h.average_price + buy_qty * trade.price) / new_qty;
                    }
                    h.quantity = h.quantity.max(0) + trade.quantity as i64;
                    h.quota_type = trade.quota_type;
                    if !trade.symbol_name.is_empty() {
                        h.symbol_name = trade.symbol_name.clone();
                    }
                }
                Transaction::Sell(sell) => {
                    h.quantity -= trade.quantity as i64;
                    h.realized_profit_loss += sell.profit_loss;
                }
            }
        }

        if let Some(h) = &holding {
            if h.quantity < 0 {
                tracing::warn!(
                    "Symbol {} is oversold by {} shares; position dropped",
                    symbol,
                    -h.quantity
                );
            }
        }

        holding
    }

    /// Current positions and aggregate valuation
    pub fn calculate_portfolio(
        ledger: &TransactionLedger,
        sector_map: &HashMap<String, String>,
    ) -> Portfolio {
        let mut positions = Vec::new();

        for symbol in ledger.symbols() {
            let Some(holding) = Self::holding(ledger, symbol) else {
                continue;
            };
            if holding.quantity <= 0 {
                continue;
            }

            let quantity = holding.quantity as u64;
            let cost = quantity as f64 * holding.average_price;
            let current_price = ledger.current_price(symbol);
            let current_value = current_price.map(|p| quantity as f64 * p);
            let unrealized_profit_loss = current_value.map(|v| v - cost);

            positions.push(Position {
                symbol: symbol.to_string(),
                symbol_name: holding.symbol_name,
                quota_type: holding.quota_type,
                sector: sector_map.get(symbol).cloned(),
                quantity,
                average_price: holding.average_price,
                cost,
                current_price,
                current_value,
                unrealized_profit_loss,
                return_rate: unrealized_profit_loss.map(|pl| percent_of(pl, cost)),
                realized_profit_loss: holding.realized_profit_loss,
            });
        }

        let total_cost: f64 = positions.iter().map(|p| p.cost).sum();
        let total_value: f64 = positions.iter().map(Position::value_or_cost).sum();

        let mut realized_profit_loss = 0.0;
        let mut tax_free_profit_loss = 0.0;
        for sell in ledger.transactions().iter().filter_map(Transaction::as_sell) {
            realized_profit_loss += sell.profit_loss;
            if sell.trade.amount > 0.0 {
                let covered = (sell.tax_free_amount / sell.trade.amount).clamp(0.0, 1.0);
                tax_free_profit_loss += sell.profit_loss * covered;
            }
        }

        tracing::debug!(
            "Portfolio valued: {} positions, cost {:.0}, value {:.0}",
            positions.len(),
            total_cost,
            total_value
        );

        Portfolio {
            positions,
            total_cost,
            total_value,
            unrealized_profit_loss: total_value - total_cost,
            realized_profit_loss,
            tax_free_profit_loss,
        }
    }

    /// Value per sector, largest first. Unpriced positions count at cost.
    pub fn sector_weights(portfolio: &Portfolio) -> Vec<SectorWeight> {
        let mut by_sector: BTreeMap<&str, f64> = BTreeMap::new();
        for p in &portfolio.positions {
            let sector = p.sector.as_deref().unwrap_or(UNKNOWN_SECTOR);
            *by_sector.entry(sector).or_insert(0.0) += p.value_or_cost();
        }

        let total: f64 = by_sector.values().sum();
        let mut weights: Vec<SectorWeight> = by_sector
            .into_iter()
            .map(|(sector, value)| SectorWeight {
                sector: sector.to_string(),
                value,
                weight: percent_of(value, total),
            })
            .collect();
        weights.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.sector.cmp(&b.sector))
        });
        weights
    }
}
