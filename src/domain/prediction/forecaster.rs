//! Horizon projection of the regime posterior

use super::state_model::{ModelParameters, StatePosterior, STATE_COUNT};
use super::HorizonForecast;
use crate::shared::types::PriceObservation;
use chrono::{DateTime, Duration, Utc};

/// Calendar horizons reported by the predictor, in days
pub const HORIZON_DAYS: [u32; 3] = [7, 30, 90];

const MIN_CONFIDENCE: f64 = 0.05;

/// Projects the state distribution forward through calendar time
pub struct Forecaster {
    confidence_decay: f64,
}

impl Forecaster {
    pub fn new(confidence_decay: f64) -> Self {
        Self { confidence_decay }
    }

    /// Produce a `{price, confidence}` pair per horizon by repeatedly
    /// applying the transition affinities, one application per observation
    /// interval, compounding the distribution-weighted regime drift into
    /// the price path. Confidence decays with projected steps, so longer
    /// horizons never report more certainty than shorter ones.
    pub fn project(
        &self,
        params: &ModelParameters,
        posterior: &StatePosterior,
        history: &[PriceObservation],
        current_price: f64,
        reference_date: DateTime<Utc>,
    ) -> Vec<HorizonForecast> {
        let step_days = observation_interval(history);
        let base_confidence = posterior.confidence();

        let mut distribution = posterior.probabilities;
        let mut price = current_price;
        let mut steps_done: u32 = 0;
        let mut horizons = Vec::with_capacity(HORIZON_DAYS.len());

        for &days in &HORIZON_DAYS {
            let steps_target = ((days as f64 / step_days).ceil() as u32).max(1);
            while steps_done < steps_target {
                distribution = advance(params, &distribution);
                let drift: f64 = distribution
                    .iter()
                    .zip(params.profiles.iter())
                    .map(|(p, profile)| p * profile.drift)
                    .sum();
                price *= 1.0 + drift;
                steps_done += 1;
            }

            let confidence = (base_confidence * self.confidence_decay.powi(steps_done as i32))
                .max(MIN_CONFIDENCE);
            horizons.push(HorizonForecast {
                days,
                date: reference_date + Duration::days(days as i64),
                price,
                confidence,
            });
        }

        horizons
    }
}

fn advance(
    params: &ModelParameters,
    distribution: &[f64; STATE_COUNT],
) -> [f64; STATE_COUNT] {
    let mut next = [0.0; STATE_COUNT];
    for (i, p) in distribution.iter().enumerate() {
        for (j, weight) in params.transitions[i].iter().enumerate() {
            next[j] += p * weight;
        }
    }
    next
}

/// Median gap between observations in days, clamped to at least one
fn observation_interval(history: &[PriceObservation]) -> f64 {
    if history.len() < 2 {
        return 1.0;
    }
    let mut gaps: Vec<f64> = history
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_hours() as f64 / 24.0)
        .filter(|d| *d > 0.0)
        .collect();
    if gaps.is_empty() {
        return 1.0;
    }
    gaps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    gaps[gaps.len() / 2].max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureExtractor;
    use crate::domain::prediction::state_model::PriceStateModel;
    use chrono::TimeZone;

    fn daily_history(prices: &[f64]) -> Vec<PriceObservation> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceObservation::new(base + Duration::days(i as i64), p, 100.0))
            .collect()
    }

    fn project(prices: &[f64], current_price: f64) -> Vec<HorizonForecast> {
        let history = daily_history(prices);
        let model = PriceStateModel::default();
        let posterior = model.infer(&FeatureExtractor::new(7).extract(&history));
        let reference = history.last().unwrap().date;
        Forecaster::new(0.97).project(model.params(), &posterior, &history, current_price, reference)
    }

    #[test]
    fn test_confidence_never_increases_with_horizon() {
        let horizons = project(&[100.0; 20], 100.0);
        assert_eq!(horizons.len(), 3);
        assert!(horizons[0].confidence >= horizons[1].confidence);
        assert!(horizons[1].confidence >= horizons[2].confidence);
        assert!(horizons[2].confidence >= MIN_CONFIDENCE);
    }

    #[test]
    fn test_stable_history_projects_near_current_price() {
        let horizons = project(&[100.0; 20], 100.0);
        for h in &horizons {
            assert!((h.price - 100.0).abs() / 100.0 < 0.05);
        }
    }

    #[test]
    fn test_declining_history_projects_falling_path() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 * 0.98f64.powi(i)).collect();
        let current = *prices.last().unwrap();
        let horizons = project(&prices, current);
        assert!(horizons[0].price < current);
        assert!(horizons[2].price < horizons[0].price);
    }

    #[test]
    fn test_horizon_dates_follow_reference() {
        let history = daily_history(&[100.0; 5]);
        let reference = history.last().unwrap().date;
        let horizons = project(&[100.0; 5], 100.0);
        assert_eq!(horizons[0].date, reference + Duration::days(7));
        assert_eq!(horizons[2].date, reference + Duration::days(90));
    }

    #[test]
    fn test_sparse_history_scales_steps_to_calendar() {
        // weekly observations: the 7-day horizon is a single step
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let history: Vec<PriceObservation> = (0..10)
            .map(|i| PriceObservation::new(base + Duration::days(i * 7), 100.0, 100.0))
            .collect();
        let model = PriceStateModel::default();
        let posterior = model.infer(&FeatureExtractor::new(7).extract(&history));
        let horizons = Forecaster::new(0.97).project(
            model.params(),
            &posterior,
            &history,
            100.0,
            history.last().unwrap().date,
        );
        // one step of decay at most for the first horizon
        assert!(horizons[0].confidence >= posterior.confidence() * 0.97 - 1e-9);
    }
}
