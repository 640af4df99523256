//! Prediction domain - price regime inference and purchase timing

pub mod state_model;
pub mod forecaster;
pub mod predictor;
pub mod watch;

pub use forecaster::Forecaster;
pub use predictor::{PricePredictor, TimingRecommendation};
pub use state_model::{ModelParameters, PriceState, PriceStateModel, StatePosterior};
pub use watch::{AlertLevel, PriceChangeEvent, PriceWatch};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Forecast for one calendar horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonForecast {
    pub days: u32,
    pub date: DateTime<Utc>,
    pub price: f64,
    pub confidence: f64,
}

/// Purchase-timing recommendation vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseRecommendation {
    BuyNow,
    Wait,
    UrgentBuy,
    Hold,
}

impl PurchaseRecommendation {
    /// Tag in the platform's persisted three-value vocabulary.
    ///
    /// `Hold` carries no urgency and collapses onto `buy_now` there.
    pub fn platform_tag(&self) -> &'static str {
        match self {
            Self::BuyNow | Self::Hold => "buy_now",
            Self::Wait => "wait",
            Self::UrgentBuy => "urgent",
        }
    }
}

/// Full prediction result for one price history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePrediction {
    pub current_state: PriceState,
    pub confidence: f64,
    pub state_probabilities: BTreeMap<PriceState, f64>,
    pub horizons: Vec<HorizonForecast>,
    pub recommendation: PurchaseRecommendation,
    pub annual_impact: f64,
    pub wait_until: Option<DateTime<Utc>>,
    pub expected_savings: Option<f64>,
}
