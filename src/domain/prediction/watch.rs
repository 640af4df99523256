//! Price movement watch and alert classification

use crate::shared::types::PriceObservation;
use crate::shared::utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity for a price move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    High,
    Medium,
    Low,
}

/// A classified price change between the two latest observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChangeEvent {
    pub old_price: f64,
    pub new_price: f64,
    /// Change in percent, signed
    pub change_pct: f64,
    pub level: AlertLevel,
    pub volume_spike: bool,
    pub timestamp: DateTime<Utc>,
}

/// Classifies the latest move in a price history against alerting
/// thresholds
pub struct PriceWatch {
    critical_pct: f64,
    high_pct: f64,
    medium_pct: f64,
    volume_spike_ratio: f64,
}

impl Default for PriceWatch {
    fn default() -> Self {
        Self {
            critical_pct: 15.0,
            high_pct: 10.0,
            medium_pct: 5.0,
            volume_spike_ratio: 2.0,
        }
    }
}

impl PriceWatch {
    pub fn new(critical_pct: f64, high_pct: f64, medium_pct: f64, volume_spike_ratio: f64) -> Self {
        Self {
            critical_pct,
            high_pct,
            medium_pct,
            volume_spike_ratio,
        }
    }

    /// Evaluate the most recent price move; `None` when the history has
    /// fewer than two observations
    pub fn evaluate(&self, history: &[PriceObservation]) -> Option<PriceChangeEvent> {
        if history.len() < 2 {
            return None;
        }
        let prev = &history[history.len() - 2];
        let last = &history[history.len() - 1];

        let change_pct = utils::fractional_change(prev.price, last.price) * 100.0;
        let volumes: Vec<f64> = history.iter().map(|o| o.volume).collect();
        let volume_mean = utils::mean(&volumes);
        let volume_spike = volume_mean > 0.0 && last.volume > self.volume_spike_ratio * volume_mean;

        Some(PriceChangeEvent {
            old_price: prev.price,
            new_price: last.price,
            change_pct,
            level: self.classify(change_pct),
            volume_spike,
            timestamp: last.date,
        })
    }

    pub fn classify(&self, change_pct: f64) -> AlertLevel {
        let magnitude = change_pct.abs();
        if magnitude > self.critical_pct {
            AlertLevel::Critical
        } else if magnitude > self.high_pct {
            AlertLevel::High
        } else if magnitude >= self.medium_pct {
            AlertLevel::Medium
        } else {
            AlertLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use test_case::test_case;

    #[test_case(20.0, AlertLevel::Critical; "large increase")]
    #[test_case(-16.0, AlertLevel::Critical; "large drop")]
    #[test_case(12.0, AlertLevel::High; "double digit move")]
    #[test_case(7.5, AlertLevel::Medium; "mid band")]
    #[test_case(5.0, AlertLevel::Medium; "medium boundary inclusive")]
    #[test_case(4.9, AlertLevel::Low; "below medium")]
    #[test_case(0.0, AlertLevel::Low; "no move")]
    fn test_classification(change_pct: f64, expected: AlertLevel) {
        let watch = PriceWatch::new(15.0, 10.0, 5.0, 2.0);
        assert_eq!(watch.classify(change_pct), expected);
    }

    #[test]
    fn test_evaluate_flags_volume_spike() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let history = vec![
            PriceObservation::new(base, 100.0, 100.0),
            PriceObservation::new(base + Duration::days(1), 100.0, 100.0),
            PriceObservation::new(base + Duration::days(2), 112.0, 500.0),
        ];
        let event = PriceWatch::default().evaluate(&history).unwrap();
        assert_eq!(event.level, AlertLevel::High);
        assert!(event.volume_spike);
        assert!((event.change_pct - 12.0).abs() < 1e-9);
        assert_eq!(event.timestamp, base + Duration::days(2));
    }

    #[test]
    fn test_evaluate_needs_two_observations() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(PriceWatch::default().evaluate(&[]).is_none());
        assert!(PriceWatch::default()
            .evaluate(&[PriceObservation::new(base, 100.0, 1.0)])
            .is_none());
    }
}
