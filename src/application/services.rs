//! Application services and use cases

use crate::domain::anomaly::{AnomalyDetector, AnomalyResult};
use crate::domain::prediction::{
    PriceChangeEvent, PricePredictor, PricePrediction, PriceWatch, TimingRecommendation,
};
use crate::shared::config::EngineConfig;
use crate::shared::errors::AppError;
use crate::shared::types::{DataPoint, PriceObservation, TransactionNode};
use tracing::info;

/// Application service bundling the analytical engines behind one
/// constructor. Holds only immutable configuration; every method is a
/// pure call/return computation safe to invoke concurrently.
pub struct IntelligenceService {
    predictor: PricePredictor,
    detector: AnomalyDetector,
    watch: PriceWatch,
}

impl IntelligenceService {
    /// Create the service from validated engine configuration
    pub fn new(config: &EngineConfig) -> Result<Self, AppError> {
        let predictor = PricePredictor::new(&config.prediction)?;
        let detector = AnomalyDetector::new(config.detection.clone())?;
        info!("intelligence service initialized");
        Ok(Self {
            predictor,
            detector,
            watch: PriceWatch::default(),
        })
    }

    /// Regime inference, horizon forecasts and purchase timing for one
    /// item's price history
    pub fn predict(
        &self,
        history: &[PriceObservation],
        current_price: f64,
        annual_volume: f64,
    ) -> PricePrediction {
        self.predictor.predict(history, current_price, annual_volume)
    }

    /// Purchase-timing recommendation, optionally against a target price
    pub fn recommend_timing(
        &self,
        history: &[PriceObservation],
        current_price: f64,
        annual_volume: f64,
        target_price: Option<f64>,
    ) -> TimingRecommendation {
        self.predictor
            .recommend_timing(history, current_price, annual_volume, target_price)
    }

    /// Statistical outlier scoring over a data-point batch
    pub fn detect(&self, points: &[DataPoint]) -> Result<Vec<AnomalyResult>, AppError> {
        Ok(self.detector.detect(points)?)
    }

    /// Structural fraud signatures over a transaction batch
    pub fn detect_graph_anomalies(
        &self,
        transactions: &[TransactionNode],
    ) -> Vec<AnomalyResult> {
        self.detector.detect_graph_anomalies(transactions)
    }

    /// Classify the most recent price move for alerting
    pub fn evaluate_price_change(
        &self,
        history: &[PriceObservation],
    ) -> Option<PriceChangeEvent> {
        self.watch.evaluate(history)
    }
}
