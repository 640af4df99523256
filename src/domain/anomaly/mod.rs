//! Anomaly domain - statistical outlier scoring and transaction-graph analysis

pub mod isolation;
pub mod reconstruction;
pub mod scorer;
pub mod graph;
pub mod detector;

pub use detector::AnomalyDetector;
pub use graph::GraphAnalyzer;
pub use isolation::IsolationDetector;
pub use reconstruction::ReconstructionDetector;
pub use scorer::OutlierScorer;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed anomaly category vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    PriceOutlier,
    QuantityOutlier,
    FeatureOutlier,
    SharedBankAccount,
    CircularPayment,
    UnusualVendorRelationship,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceOutlier => write!(f, "price_outlier"),
            Self::QuantityOutlier => write!(f, "quantity_outlier"),
            Self::FeatureOutlier => write!(f, "feature_outlier"),
            Self::SharedBankAccount => write!(f, "shared_bank_account"),
            Self::CircularPayment => write!(f, "circular_payment"),
            Self::UnusualVendorRelationship => write!(f, "unusual_vendor_relationship"),
        }
    }
}

/// One anomaly verdict, keyed by the scored point or transaction id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub point_id: String,
    pub is_anomaly: bool,
    pub score: f64,
    pub anomaly_type: AnomalyType,
}
