use anyhow::{Context, Result};
use nisa_core::{NisaError, NisaResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

/// Japanese capital gains rate: 15% income tax + 0.315% reconstruction
/// surtax + 5% resident tax
pub const DEFAULT_TAX_RATE: f64 = 0.20315;

/// Annual utilization rates (percent) at which alerts fire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub warning_rate: f64,
    pub critical_rate: f64,
    /// Lifetime utilization rate that raises a warning
    pub lifetime_warning_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            warning_rate: 80.0,
            critical_rate: 90.0,
            lifetime_warning_rate: 90.0,
        }
    }
}

/// Utilization bands that drive allocation priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationThresholds {
    /// Below this rate the quota is HIGH priority
    pub low_water_rate: f64,
    /// At or above this rate the quota is LOW priority
    pub high_water_rate: f64,
    /// Share of the remaining quota suggested at MEDIUM priority
    pub medium_fraction: f64,
    /// Share of the remaining quota suggested at LOW priority
    pub conservative_fraction: f64,
}

impl Default for OptimizationThresholds {
    fn default() -> Self {
        Self {
            low_water_rate: 50.0,
            high_water_rate: 80.0,
            medium_fraction: 0.5,
            conservative_fraction: 0.25,
        }
    }
}

/// Externally supplied configuration for the calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NisaSettings {
    pub assumed_tax_rate: f64,
    pub alerts: AlertThresholds,
    pub optimization: OptimizationThresholds,
    /// symbol -> sector
    pub sectors: HashMap<String, String>,
}

impl Default for NisaSettings {
    fn default() -> Self {
        Self {
            assumed_tax_rate: DEFAULT_TAX_RATE,
            alerts: AlertThresholds::default(),
            optimization: OptimizationThresholds::default(),
            sectors: HashMap::new(),
        }
    }
}

impl NisaSettings {
    /// Load thresholds and the tax rate from `NISA_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup, falling back to defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str, default: f64| -> Result<f64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
                None => Ok(default),
            }
        };

        let settings = Self {
            assumed_tax_rate: read("NISA_TAX_RATE", defaults.assumed_tax_rate)?,
            alerts: AlertThresholds {
                warning_rate: read("NISA_WARNING_RATE", defaults.alerts.warning_rate)?,
                critical_rate: read("NISA_CRITICAL_RATE", defaults.alerts.critical_rate)?,
                lifetime_warning_rate: read(
                    "NISA_LIFETIME_WARNING_RATE",
                    defaults.alerts.lifetime_warning_rate,
                )?,
            },
            optimization: OptimizationThresholds {
                low_water_rate: read("NISA_LOW_WATER_RATE", defaults.optimization.low_water_rate)?,
                high_water_rate: read(
                    "NISA_HIGH_WATER_RATE",
                    defaults.optimization.high_water_rate,
                )?,
                ..defaults.optimization
            },
            sectors: HashMap::new(),
        };

        settings.validate().context("Invalid NISA settings")?;
        Ok(settings)
    }

    pub fn validate(&self) -> NisaResult<()> {
        if !(0.0..1.0).contains(&self.assumed_tax_rate) {
            return Err(NisaError::Config(format!(
                "assumed_tax_rate must be in [0, 1), got {}",
                self.assumed_tax_rate
            )));
        }
        if self.alerts.warning_rate <= 0.0 || self.alerts.warning_rate >= self.alerts.critical_rate {
            return Err(NisaError::Config(format!(
                "warning_rate ({}) must be positive and below critical_rate ({})",
                self.alerts.warning_rate, self.alerts.critical_rate
            )));
        }
        if self.alerts.lifetime_warning_rate <= 0.0 {
            return Err(NisaError::Config(
                "lifetime_warning_rate must be positive".to_string(),
            ));
        }
        let opt = &self.optimization;
        if opt.low_water_rate < 0.0 || opt.low_water_rate >= opt.high_water_rate {
            return Err(NisaError::Config(format!(
                "low_water_rate ({}) must be non-negative and below high_water_rate ({})",
                opt.low_water_rate, opt.high_water_rate
            )));
        }
        for (name, fraction) in [
            ("medium_fraction", opt.medium_fraction),
            ("conservative_fraction", opt.conservative_fraction),
        ] {
            if fraction <= 0.0 || fraction > 1.0 {
                return Err(NisaError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, fraction
                )));
            }
        }
        Ok(())
    }

    pub fn sector_of(&self, symbol: &str) -> Option<&str> {
        self.sectors.get(symbol).map(String::as_str)
    }
}
