//! Engine configuration - thresholds and model tuning

use crate::shared::errors::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Prediction tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Trailing window (in observations) for the rolling volatility measure
    pub volatility_window: usize,
    /// Fractional 7-day rise above current price that triggers an urgent buy
    pub urgency_margin: f64,
    /// Per-projected-step confidence decay applied to horizon forecasts
    pub confidence_decay: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            volatility_window: 7,
            urgency_margin: 0.01,
            confidence_decay: 0.97,
        }
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volatility_window < 2 {
            return Err(ConfigError::WindowTooSmall(self.volatility_window));
        }
        if self.urgency_margin < 0.0 {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "urgency_margin",
                value: self.urgency_margin,
            });
        }
        if self.confidence_decay <= 0.0 || self.confidence_decay > 1.0 {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "confidence_decay",
                value: self.confidence_decay,
            });
        }
        Ok(())
    }
}

/// Outlier and graph detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Sensitivity of the isolation-style detector
    pub isolation_forest_threshold: f64,
    /// Sensitivity of the reconstruction-style detector
    pub autoencoder_threshold: f64,
    /// Number of trees in the isolation ensemble
    pub isolation_trees: usize,
    /// Seed for the randomized partitions; fixed so scoring is reproducible
    pub isolation_seed: u64,
    /// Maximum hops explored by the circular-payment search
    pub cycle_max_hops: usize,
    /// Relative amount spread tolerated within a payment cycle
    pub cycle_amount_tolerance: f64,
    /// Z-score above which a vendor pair's concentration is an outlier
    pub concentration_z_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            isolation_forest_threshold: 0.6,
            autoencoder_threshold: 0.7,
            isolation_trees: 100,
            isolation_seed: 7,
            cycle_max_hops: 5,
            cycle_amount_tolerance: 0.2,
            concentration_z_threshold: 2.0,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.isolation_forest_threshold)
            || self.isolation_forest_threshold == 0.0
        {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "isolation_forest_threshold",
                value: self.isolation_forest_threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.autoencoder_threshold) || self.autoencoder_threshold == 0.0 {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "autoencoder_threshold",
                value: self.autoencoder_threshold,
            });
        }
        if self.isolation_trees == 0 {
            return Err(ConfigError::EmptyEnsemble);
        }
        if self.cycle_max_hops < 2 {
            return Err(ConfigError::CycleBoundTooSmall(self.cycle_max_hops));
        }
        if self.cycle_amount_tolerance < 0.0 {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "cycle_amount_tolerance",
                value: self.cycle_amount_tolerance,
            });
        }
        if self.concentration_z_threshold <= 0.0 {
            return Err(ConfigError::ThresholdOutOfRange {
                name: "concentration_z_threshold",
                value: self.concentration_z_threshold,
            });
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub prediction: PredictionConfig,
    pub detection: DetectionConfig,
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())?;
        let cfg: Self = toml::from_str(&s).context("parse engine config")?;
        cfg.validate().context("validate engine config")?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prediction.validate()?;
        self.detection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let cfg = DetectionConfig {
            isolation_forest_threshold: -0.5,
            ..DetectionConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ThresholdOutOfRange { name, .. }) if name == "isolation_forest_threshold"
        ));
    }

    #[test]
    fn test_zero_trees_rejected() {
        let cfg = DetectionConfig {
            isolation_trees: 0,
            ..DetectionConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyEnsemble)));
    }

    #[test]
    fn test_decay_above_one_rejected() {
        let cfg = PredictionConfig {
            confidence_decay: 1.5,
            ..PredictionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: EngineConfig =
            toml::from_str("[detection]\nisolation_forest_threshold = 0.5\n").unwrap();
        assert_eq!(cfg.detection.isolation_forest_threshold, 0.5);
        assert_eq!(cfg.detection.autoencoder_threshold, 0.7);
        assert_eq!(cfg.prediction.volatility_window, 7);
    }
}
