use nisa_core::QuotaType;
use serde::{Deserialize, Serialize};

/// Usage of one quota bucket in the current tax year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub quota_type: QuotaType,
    pub annual_limit: f64,
    /// Reuse carried in from the previous tax year by a rollover
    pub carried_over: f64,
    /// Σ BUY.amount − Σ SELL.amount in the current window
    pub used_amount: f64,
    /// annual_limit + carried_over − used_amount, may be negative
    pub available_amount: f64,
    /// used_amount / annual_limit × 100, not clamped
    pub utilization_rate: f64,
    pub lifetime_limit: f64,
    pub lifetime_used_amount: f64,
    pub lifetime_available_amount: f64,
    pub lifetime_utilization_rate: f64,
}

/// Quota released by sales, usable from the next tax year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotaReuse {
    pub growth_available: f64,
    pub accumulation_available: f64,
    pub next_year_available: f64,
}

impl QuotaReuse {
    pub fn get(&self, quota_type: QuotaType) -> f64 {
        match quota_type {
            QuotaType::Growth => self.growth_available,
            QuotaType::Accumulation => self.accumulation_available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// None when the ledger has not been rolled over into a tax year yet
    pub tax_year: Option<i32>,
    pub growth: QuotaUsage,
    pub accumulation: QuotaUsage,
    pub quota_reuse: QuotaReuse,
}

impl QuotaStatus {
    pub fn usage(&self, quota_type: QuotaType) -> &QuotaUsage {
        match quota_type {
            QuotaType::Growth => &self.growth,
            QuotaType::Accumulation => &self.accumulation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub symbol_name: String,
    /// Quota of the most recent purchase
    pub quota_type: QuotaType,
    pub sector: Option<String>,
    pub quantity: u64,
    /// Weighted-average purchase price, unchanged by sells
    pub average_price: f64,
    pub cost: f64,
    pub current_price: Option<f64>,
    pub current_value: Option<f64>,
    pub unrealized_profit_loss: Option<f64>,
    /// Unrealized P&L as a percentage of cost
    pub return_rate: Option<f64>,
    pub realized_profit_loss: f64,
}

impl Position {
    /// Market value, falling back to cost when no price is known
    pub fn value_or_cost(&self) -> f64 {
        self.current_value.unwrap_or(self.cost)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub positions: Vec<Position>,
    pub total_cost: f64,
    /// Unpriced positions are included at cost
    pub total_value: f64,
    pub unrealized_profit_loss: f64,
    pub realized_profit_loss: f64,
    /// Realized P&L weighted by the share of each sale released from quota
    pub tax_free_profit_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorWeight {
    pub sector: String,
    pub value: f64,
    /// Share of portfolio value, 0-100
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub quota_type: QuotaType,
    /// Utilization percentage that triggered the alert
    pub current_usage: f64,
    pub threshold: f64,
    pub message: String,
    pub recommended_action: String,
}

/// Investment priority for a quota bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaRecommendation {
    pub quota_type: QuotaType,
    pub utilization_rate: f64,
    pub available_amount: f64,
    pub suggested_amount: f64,
    pub priority: Priority,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Classify a 0-100 concentration score
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 30.0 => RiskLevel::Low,
            s if s < 50.0 => RiskLevel::Moderate,
            _ => RiskLevel::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    /// 0 (single sector) to 100 (evenly spread)
    pub diversification_score: f64,
    pub sector_concentration: Vec<SectorWeight>,
    pub largest_sector: Option<SectorWeight>,
    pub concentration_risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    pub growth: QuotaRecommendation,
    pub accumulation: QuotaRecommendation,
    pub total_suggested_amount: f64,
    pub risk_analysis: RiskAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxCalculation {
    pub tax_year: Option<i32>,
    pub growth_used: f64,
    pub accumulation_used: f64,
    /// Annual limit plus pending quota reuse
    pub growth_next_year_available: f64,
    pub accumulation_next_year_available: f64,
    pub total_next_year_available: f64,
    pub realized_profit_loss: f64,
    pub tax_free_profit_loss: f64,
    pub unrealized_profit_loss: f64,
    pub assumed_tax_rate: f64,
    /// Tax a taxable account would have paid on the tax-free gains
    pub estimated_tax_savings: f64,
    /// Savings if current unrealized gains were realized, never negative
    pub potential_tax_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerSummary {
    pub symbol: String,
    pub symbol_name: String,
    pub return_rate: f64,
    pub profit_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NisaStatistics {
    pub total_invested: f64,
    pub total_value: f64,
    pub total_profit_loss: f64,
    /// Percentage, 0 when nothing is invested
    pub average_return: f64,
    pub realized_profit_loss: f64,
    pub position_count: usize,
    pub best_performer: Option<PerformerSummary>,
    pub worst_performer: Option<PerformerSummary>,
    pub diversification_score: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub sector_allocation: Vec<SectorWeight>,
}

/// Every calculator output for one ledger state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NisaReport {
    pub quota_status: QuotaStatus,
    pub portfolio: Portfolio,
    pub optimization: OptimizationRecommendation,
    pub alerts: Vec<Alert>,
    pub tax: TaxCalculation,
    pub statistics: NisaStatistics,
}
