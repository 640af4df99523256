//! Procintel - Procurement Intelligence Engine
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use application::IntelligenceService;
pub use domain::anomaly::{AnomalyDetector, AnomalyResult, AnomalyType};
pub use domain::prediction::{
    PricePredictor, PricePrediction, PriceState, PurchaseRecommendation,
};
pub use shared::config::EngineConfig;
pub use shared::types::{DataPoint, PriceObservation, TransactionNode};
