//! Hidden-state price regime model

use crate::domain::features::{FeatureSeries, PriceFeatures};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const STATE_COUNT: usize = 6;

const EMISSION_FLOOR: f64 = 1e-9;

/// Latent price regime
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceState {
    Stable,
    Rising,
    Peak,
    Declining,
    Trough,
    Volatile,
}

impl PriceState {
    pub const ALL: [PriceState; STATE_COUNT] = [
        PriceState::Stable,
        PriceState::Rising,
        PriceState::Peak,
        PriceState::Declining,
        PriceState::Trough,
        PriceState::Volatile,
    ];

    pub fn index(&self) -> usize {
        match self {
            Self::Stable => 0,
            Self::Rising => 1,
            Self::Peak => 2,
            Self::Declining => 3,
            Self::Trough => 4,
            Self::Volatile => 5,
        }
    }
}

impl fmt::Display for PriceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "STABLE"),
            Self::Rising => write!(f, "RISING"),
            Self::Peak => write!(f, "PEAK"),
            Self::Declining => write!(f, "DECLINING"),
            Self::Trough => write!(f, "TROUGH"),
            Self::Volatile => write!(f, "VOLATILE"),
        }
    }
}

/// Emission profile for one regime: expected per-step change and the
/// volatility band the regime typically lives in
#[derive(Debug, Clone, Copy)]
pub struct RegimeProfile {
    pub change_mean: f64,
    pub change_tol: f64,
    pub vol_center: f64,
    pub vol_width: f64,
    /// Expected fractional price drift per projected step
    pub drift: f64,
}

/// Fixed regime parameters: transition affinities and emission profiles.
///
/// Immutable configuration data, constructed once and injected into the
/// model; nothing here is learned online.
#[derive(Debug, Clone)]
pub struct ModelParameters {
    /// Row-stochastic transition affinities, indexed [from][to] in
    /// `PriceState::ALL` order
    pub transitions: [[f64; STATE_COUNT]; STATE_COUNT],
    pub profiles: [RegimeProfile; STATE_COUNT],
}

impl Default for ModelParameters {
    fn default() -> Self {
        // Regimes persist; adjacency follows the price cycle
        // STABLE-RISING-PEAK-DECLINING-TROUGH-STABLE, and VOLATILE can
        // jump anywhere.
        let transitions = [
            // from Stable
            [0.60, 0.12, 0.04, 0.04, 0.12, 0.08],
            // from Rising
            [0.12, 0.60, 0.12, 0.04, 0.04, 0.08],
            // from Peak: the likely exit is downward
            [0.04, 0.12, 0.55, 0.17, 0.04, 0.08],
            // from Declining
            [0.04, 0.04, 0.12, 0.60, 0.12, 0.08],
            // from Trough: the likely exit is recovery
            [0.17, 0.04, 0.04, 0.12, 0.55, 0.08],
            // from Volatile
            [0.16, 0.16, 0.16, 0.16, 0.16, 0.20],
        ];

        let profiles = [
            // Stable: flat changes, quiet volatility
            RegimeProfile {
                change_mean: 0.0,
                change_tol: 0.010,
                vol_center: 0.0,
                vol_width: 0.020,
                drift: 0.0,
            },
            // Rising: sustained ~2% upward steps
            RegimeProfile {
                change_mean: 0.020,
                change_tol: 0.015,
                vol_center: 0.020,
                vol_width: 0.025,
                drift: 0.018,
            },
            // Peak: decelerating gains, churning volatility
            RegimeProfile {
                change_mean: 0.012,
                change_tol: 0.020,
                vol_center: 0.045,
                vol_width: 0.030,
                drift: 0.004,
            },
            // Declining: sustained ~2% downward steps
            RegimeProfile {
                change_mean: -0.020,
                change_tol: 0.015,
                vol_center: 0.020,
                vol_width: 0.025,
                drift: -0.018,
            },
            // Trough: decelerating losses
            RegimeProfile {
                change_mean: -0.012,
                change_tol: 0.020,
                vol_center: 0.045,
                vol_width: 0.030,
                drift: -0.004,
            },
            // Volatile: large swings of either sign
            RegimeProfile {
                change_mean: 0.0,
                change_tol: 0.080,
                vol_center: 0.110,
                vol_width: 0.060,
                drift: 0.0,
            },
        ];

        Self {
            transitions,
            profiles,
        }
    }
}

/// Posterior over regimes after consuming a feature series
#[derive(Debug, Clone)]
pub struct StatePosterior {
    /// Probabilities in `PriceState::ALL` order, summing to 1
    pub probabilities: [f64; STATE_COUNT],
    pub low_evidence: bool,
}

impl StatePosterior {
    pub fn dominant(&self) -> PriceState {
        let mut best = 0;
        for i in 1..STATE_COUNT {
            if self.probabilities[i] > self.probabilities[best] {
                best = i;
            }
        }
        PriceState::ALL[best]
    }

    pub fn confidence(&self) -> f64 {
        self.probabilities[self.dominant().index()]
    }
}

/// Regime inference over extracted price features
pub struct PriceStateModel {
    params: ModelParameters,
}

impl Default for PriceStateModel {
    fn default() -> Self {
        Self::new(ModelParameters::default())
    }
}

impl PriceStateModel {
    pub fn new(params: ModelParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// Forward-accumulate transition affinities and emission likelihoods
    /// over the series to a posterior over the six regimes.
    ///
    /// An empty series (fewer than two observations upstream) yields the
    /// insufficient-evidence default: a stable-leaning posterior whose
    /// confidence stays below 0.5.
    pub fn infer(&self, series: &FeatureSeries) -> StatePosterior {
        if series.points.is_empty() {
            let mut probabilities = [0.13; STATE_COUNT];
            probabilities[PriceState::Stable.index()] = 0.35;
            return StatePosterior {
                probabilities,
                low_evidence: true,
            };
        }

        let mut alpha = [1.0 / STATE_COUNT as f64; STATE_COUNT];
        for features in &series.points {
            let emission = self.emission(features);
            let mut next = [0.0; STATE_COUNT];
            for (j, e) in emission.iter().enumerate() {
                let mut carried = 0.0;
                for (i, a) in alpha.iter().enumerate() {
                    carried += a * self.params.transitions[i][j];
                }
                next[j] = carried * e;
            }
            normalize(&mut next);
            alpha = next;
        }

        StatePosterior {
            probabilities: alpha,
            low_evidence: false,
        }
    }

    /// Gaussian-style distance of the observed (change, volatility) pair
    /// from each regime's profile, floored so no state fully vanishes
    fn emission(&self, features: &PriceFeatures) -> [f64; STATE_COUNT] {
        let mut scores = [0.0; STATE_COUNT];
        for (s, profile) in self.params.profiles.iter().enumerate() {
            let dz = (features.pct_change - profile.change_mean) / profile.change_tol;
            let vz = (features.volatility - profile.vol_center) / profile.vol_width;
            scores[s] = (-0.5 * (dz * dz + vz * vz)).exp() + EMISSION_FLOOR;
        }
        scores
    }
}

fn normalize(values: &mut [f64; STATE_COUNT]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for v in values.iter_mut() {
            *v /= sum;
        }
    } else {
        values.fill(1.0 / STATE_COUNT as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureExtractor;
    use crate::shared::types::PriceObservation;
    use chrono::{Duration, TimeZone, Utc};

    fn series_for(prices: &[f64]) -> FeatureSeries {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let history: Vec<PriceObservation> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceObservation::new(base + Duration::days(i as i64), p, 100.0))
            .collect();
        FeatureExtractor::new(7).extract(&history)
    }

    fn infer(prices: &[f64]) -> StatePosterior {
        PriceStateModel::default().infer(&series_for(prices))
    }

    #[test]
    fn test_transition_rows_are_stochastic() {
        let params = ModelParameters::default();
        for row in &params.transitions {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_prices_infer_stable() {
        let posterior = infer(&[100.0; 15]);
        assert_eq!(posterior.dominant(), PriceState::Stable);
        assert!(posterior.confidence() > 0.5);
    }

    #[test]
    fn test_steady_rise_infers_upward_regime() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 * 1.02f64.powi(i)).collect();
        let posterior = infer(&prices);
        assert!(matches!(
            posterior.dominant(),
            PriceState::Rising | PriceState::Peak
        ));
    }

    #[test]
    fn test_steady_fall_infers_downward_regime() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 * 0.98f64.powi(i)).collect();
        let posterior = infer(&prices);
        assert!(matches!(
            posterior.dominant(),
            PriceState::Declining | PriceState::Trough
        ));
    }

    #[test]
    fn test_oscillation_infers_volatile() {
        let prices: Vec<f64> = (0..30)
            .map(|i| if i % 2 == 0 { 100.0 } else { 120.0 })
            .collect();
        let posterior = infer(&prices);
        assert_eq!(posterior.dominant(), PriceState::Volatile);
    }

    #[test]
    fn test_empty_series_defaults_to_cautious_stable() {
        let posterior = infer(&[]);
        assert!(posterior.low_evidence);
        assert_eq!(posterior.dominant(), PriceState::Stable);
        assert!(posterior.confidence() < 0.5);
        let sum: f64 = posterior.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_posterior_always_sums_to_one() {
        for prices in [
            vec![100.0; 10],
            (0..25).map(|i| 100.0 + i as f64).collect::<Vec<_>>(),
            vec![10.0, 400.0, 3.0, 250.0, 12.0],
        ] {
            let posterior = infer(&prices);
            let sum: f64 = posterior.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }
}
