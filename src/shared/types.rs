//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observed unit price for an item/vendor pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
}

impl PriceObservation {
    pub fn new(date: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self { date, price, volume }
    }
}

/// One scorable unit (invoice line, transaction) with its feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: String,
    pub features: Vec<f64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl DataPoint {
    pub fn new(id: impl Into<String>, features: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            features,
            metadata: BTreeMap::new(),
        }
    }
}

/// One payment record in the vendor transaction graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionNode {
    pub id: String,
    pub vendor_id: String,
    pub amount: f64,
    pub bank_account: Option<String>,
    pub target_vendor_id: Option<String>,
    pub date: DateTime<Utc>,
}
