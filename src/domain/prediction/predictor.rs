//! Price prediction facade

use super::forecaster::Forecaster;
use super::state_model::{PriceState, PriceStateModel, StatePosterior, STATE_COUNT};
use super::{HorizonForecast, PricePrediction, PurchaseRecommendation};
use crate::domain::features::FeatureExtractor;
use crate::shared::config::PredictionConfig;
use crate::shared::errors::ConfigError;
use crate::shared::types::PriceObservation;
use crate::shared::utils;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Timing recommendation with optional target-price attainment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingRecommendation {
    pub recommendation: PurchaseRecommendation,
    pub wait_until: Option<DateTime<Utc>>,
    pub expected_savings: Option<f64>,
    /// Probability-weighted chance that a horizon reaches the target price
    pub target_attainment: Option<f64>,
}

/// Main prediction facade: regime inference, horizon forecasts, purchase
/// timing and annual cost impact from one price history
pub struct PricePredictor {
    extractor: FeatureExtractor,
    model: PriceStateModel,
    forecaster: Forecaster,
    urgency_margin: f64,
}

impl PricePredictor {
    pub fn new(config: &PredictionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(config.volatility_window),
            model: PriceStateModel::default(),
            forecaster: Forecaster::new(config.confidence_decay),
            urgency_margin: config.urgency_margin,
        })
    }

    /// Predict the current regime and near-term price path.
    ///
    /// Degenerate histories (empty or single observation) are answered
    /// with a well-formed low-confidence default, never an error.
    pub fn predict(
        &self,
        history: &[PriceObservation],
        current_price: f64,
        annual_volume: f64,
    ) -> PricePrediction {
        let series = self.extractor.extract(history);
        let posterior = self.model.infer(&series);

        let reference_date = history.last().map(|o| o.date).unwrap_or_else(Utc::now);
        let horizons = self.forecaster.project(
            self.model.params(),
            &posterior,
            history,
            current_price,
            reference_date,
        );

        let current_state = posterior.dominant();
        let near_term_state = self.near_term_state(&posterior);
        let recommendation =
            self.recommend(current_state, near_term_state, &horizons, current_price);

        let (wait_until, expected_savings) = if recommendation == PurchaseRecommendation::Wait {
            wait_terms(&horizons, current_price, annual_volume)
        } else {
            (None, None)
        };

        let annual_impact = annual_impact(history, current_price, annual_volume);

        debug!(
            state = %current_state,
            confidence = posterior.confidence(),
            recommendation = recommendation.platform_tag(),
            "price prediction computed"
        );

        PricePrediction {
            current_state,
            confidence: posterior.confidence(),
            state_probabilities: probability_map(&posterior),
            horizons,
            recommendation,
            annual_impact,
            wait_until,
            expected_savings,
        }
    }

    /// Purchase-timing view of `predict`, optionally scoring the chance
    /// of reaching a caller-supplied target price within the horizons.
    pub fn recommend_timing(
        &self,
        history: &[PriceObservation],
        current_price: f64,
        annual_volume: f64,
        target_price: Option<f64>,
    ) -> TimingRecommendation {
        let prediction = self.predict(history, current_price, annual_volume);
        let target_attainment = target_price.map(|target| {
            let total: f64 = prediction.horizons.iter().map(|h| h.confidence).sum();
            if total <= 0.0 {
                return 0.0;
            }
            let hits: f64 = prediction
                .horizons
                .iter()
                .filter(|h| h.price <= target)
                .map(|h| h.confidence)
                .sum();
            (hits / total).clamp(0.0, 1.0)
        });

        TimingRecommendation {
            recommendation: prediction.recommendation,
            wait_until: prediction.wait_until,
            expected_savings: prediction.expected_savings,
            target_attainment,
        }
    }

    /// Dominant regime after one transition step
    fn near_term_state(&self, posterior: &StatePosterior) -> PriceState {
        let transitions = &self.model.params().transitions;
        let mut next = [0.0; STATE_COUNT];
        for (i, p) in posterior.probabilities.iter().enumerate() {
            for (j, weight) in transitions[i].iter().enumerate() {
                next[j] += p * weight;
            }
        }
        let mut best = 0;
        for i in 1..STATE_COUNT {
            if next[i] > next[best] {
                best = i;
            }
        }
        PriceState::ALL[best]
    }

    fn recommend(
        &self,
        current_state: PriceState,
        near_term_state: PriceState,
        horizons: &[HorizonForecast],
        current_price: f64,
    ) -> PurchaseRecommendation {
        let falling = |s: PriceState| matches!(s, PriceState::Declining | PriceState::Trough);
        if falling(current_state) || falling(near_term_state) {
            return PurchaseRecommendation::Wait;
        }

        let seven_day = horizons.first();
        let rising_now = matches!(current_state, PriceState::Rising | PriceState::Peak);
        if rising_now {
            if let Some(h) = seven_day {
                if current_price > 0.0 && h.price >= current_price * (1.0 + self.urgency_margin) {
                    return PurchaseRecommendation::UrgentBuy;
                }
            }
        }

        if current_state == PriceState::Volatile {
            PurchaseRecommendation::Hold
        } else {
            PurchaseRecommendation::BuyNow
        }
    }
}

/// `(currentPrice - baselinePrice) * annualVolume` with the mean of the
/// supplied history as baseline; zero impact for empty history or volume
fn annual_impact(history: &[PriceObservation], current_price: f64, annual_volume: f64) -> f64 {
    if history.is_empty() || annual_volume == 0.0 {
        return 0.0;
    }
    let prices: Vec<f64> = history.iter().map(|o| o.price).collect();
    (current_price - utils::mean(&prices)) * annual_volume
}

fn wait_terms(
    horizons: &[HorizonForecast],
    current_price: f64,
    annual_volume: f64,
) -> (Option<DateTime<Utc>>, Option<f64>) {
    let lowest = horizons.iter().min_by(|a, b| {
        a.price
            .partial_cmp(&b.price)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    match lowest {
        Some(h) => {
            let savings = (current_price - h.price).max(0.0) * annual_volume;
            (Some(h.date), Some(savings))
        }
        None => (None, None),
    }
}

fn probability_map(posterior: &StatePosterior) -> BTreeMap<PriceState, f64> {
    PriceState::ALL
        .iter()
        .map(|&s| (s, posterior.probabilities[s.index()]))
        .collect()
}
