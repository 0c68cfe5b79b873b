//! Statistics Aggregator
//!
//! Portfolio-wide return and diversification figures.

use crate::models::{NisaStatistics, PerformerSummary, Portfolio, Position, RiskLevel};
use crate::portfolio::PortfolioValuator;
use crate::shared_math::{herfindahl_index, normalize, percent_of};

pub struct StatisticsAggregator;

impl StatisticsAggregator {
    fn performer(position: &Position) -> Option<PerformerSummary> {
        Some(PerformerSummary {
            symbol: position.symbol.clone(),
            symbol_name: position.symbol_name.clone(),
            return_rate: position.return_rate?,
            profit_loss: position.unrealized_profit_loss?,
        })
    }

    pub fn calculate_statistics(portfolio: &Portfolio) -> NisaStatistics {
        let total_invested = portfolio.total_cost;
        let total_value = portfolio.total_value;
        let total_profit_loss = total_value - total_invested;

        let performers: Vec<PerformerSummary> =
            portfolio.positions.iter().filter_map(Self::performer).collect();
        let by_return = |a: &&PerformerSummary, b: &&PerformerSummary| {
            a.return_rate
                .partial_cmp(&b.return_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        };
        let best_performer = performers.iter().max_by(by_return).cloned();
        let worst_performer = performers.iter().min_by(by_return).cloned();

        let sector_allocation = PortfolioValuator::sector_weights(portfolio);
        let (diversification_score, risk_score) = if sector_allocation.is_empty() {
            (0.0, 0.0)
        } else {
            let values: Vec<f64> = sector_allocation.iter().map(|s| s.value).collect();
            let weights = normalize(&values);
            let hhi = herfindahl_index(&weights);
            ((1.0 - hhi) * 100.0, hhi * 100.0)
        };

        NisaStatistics {
            total_invested,
            total_value,
            total_profit_loss,
            average_return: percent_of(total_profit_loss, total_invested),
            realized_profit_loss: portfolio.realized_profit_loss,
            position_count: portfolio.positions.len(),
            best_performer,
            worst_performer,
            diversification_score,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            sector_allocation,
        }
    }
}
