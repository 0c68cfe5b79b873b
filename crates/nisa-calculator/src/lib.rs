//! NISA Calculator
//!
//! Quota accounting, portfolio valuation, alerts, allocation advice and tax
//! estimates computed from a `TransactionLedger`.

pub mod alerts;
pub mod calculator;
pub mod models;
pub mod optimization;
pub mod portfolio;
pub mod quota;
pub mod reuse;
pub mod service;
pub mod settings;
pub mod shared_math;
pub mod statistics;
pub mod tax;

pub use alerts::AlertGenerator;
pub use calculator::NisaCalculator;
pub use models::*;
pub use optimization::OptimizationAdvisor;
pub use portfolio::PortfolioValuator;
pub use quota::QuotaAccountant;
pub use reuse::QuotaReuseEngine;
pub use service::SharedNisaCalculator;
pub use settings::{AlertThresholds, NisaSettings, OptimizationThresholds};
pub use statistics::StatisticsAggregator;
pub use tax::TaxEstimator;
