//! Price history feature extraction

use crate::shared::types::PriceObservation;
use crate::shared::utils;

/// Engineered signals for one observation step
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFeatures {
    /// Fractional day-over-day price change
    pub pct_change: f64,
    /// Standard deviation of recent price changes over the trailing window
    pub volatility: f64,
    /// Current volume relative to the running mean volume
    pub volume_ratio: f64,
}

/// Extracted feature series; `low_evidence` marks histories too short to
/// carry any signal
#[derive(Debug, Clone)]
pub struct FeatureSeries {
    pub points: Vec<PriceFeatures>,
    pub low_evidence: bool,
}

/// Turns a raw price history into per-step model inputs
pub struct FeatureExtractor {
    volatility_window: usize,
}

impl FeatureExtractor {
    pub fn new(volatility_window: usize) -> Self {
        Self { volatility_window }
    }

    /// Extract one feature point per consecutive observation pair.
    ///
    /// Histories shorter than two observations have no defined change or
    /// volatility; they yield an empty series flagged as low evidence
    /// rather than an error.
    pub fn extract(&self, history: &[PriceObservation]) -> FeatureSeries {
        if history.len() < 2 {
            return FeatureSeries {
                points: Vec::new(),
                low_evidence: true,
            };
        }

        let mut points = Vec::with_capacity(history.len() - 1);
        let mut changes = Vec::with_capacity(history.len() - 1);
        let mut volume_sum = history[0].volume;

        for i in 1..history.len() {
            let change = utils::fractional_change(history[i - 1].price, history[i].price);
            changes.push(change);

            let start = changes.len().saturating_sub(self.volatility_window);
            let volatility = utils::std_dev(&changes[start..]);

            volume_sum += history[i].volume;
            let volume_mean = volume_sum / (i + 1) as f64;
            let volume_ratio = if volume_mean > 0.0 {
                history[i].volume / volume_mean
            } else {
                1.0
            };

            points.push(PriceFeatures {
                pct_change: change,
                volatility,
                volume_ratio,
            });
        }

        FeatureSeries {
            points,
            low_evidence: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn history(prices: &[f64]) -> Vec<PriceObservation> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceObservation::new(base + Duration::days(i as i64), p, 100.0))
            .collect()
    }

    #[test]
    fn test_constant_prices_have_neutral_features() {
        let extractor = FeatureExtractor::new(7);
        let series = extractor.extract(&history(&[100.0; 12]));
        assert_eq!(series.points.len(), 11);
        assert!(!series.low_evidence);
        for p in &series.points {
            assert_eq!(p.pct_change, 0.0);
            assert_eq!(p.volatility, 0.0);
        }
    }

    #[test]
    fn test_short_history_is_low_evidence() {
        let extractor = FeatureExtractor::new(7);
        assert!(extractor.extract(&[]).low_evidence);
        assert!(extractor.extract(&history(&[100.0])).low_evidence);
    }

    #[test]
    fn test_pct_change_and_volatility() {
        let extractor = FeatureExtractor::new(7);
        let series = extractor.extract(&history(&[100.0, 110.0, 99.0]));
        assert!((series.points[0].pct_change - 0.1).abs() < 1e-12);
        assert!((series.points[1].pct_change + 0.1).abs() < 1e-12);
        // two changes of opposite sign produce a nonzero rolling volatility
        assert!(series.points[1].volatility > 0.1);
    }

    #[test]
    fn test_volume_ratio_tracks_running_mean() {
        let extractor = FeatureExtractor::new(7);
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let obs: Vec<PriceObservation> = (0..4)
            .map(|i| {
                let volume = if i == 3 { 400.0 } else { 100.0 };
                PriceObservation::new(base + Duration::days(i), 50.0, volume)
            })
            .collect();
        let series = extractor.extract(&obs);
        let last = series.points.last().unwrap();
        // 400 against a running mean of 175
        assert!((last.volume_ratio - 400.0 / 175.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_prior_price_degrades_to_zero_change() {
        let extractor = FeatureExtractor::new(7);
        let series = extractor.extract(&history(&[0.0, 10.0, 10.0]));
        assert_eq!(series.points[0].pct_change, 0.0);
    }
}
