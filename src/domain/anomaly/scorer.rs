//! Ensemble outlier scorer

use super::{AnomalyResult, AnomalyType, IsolationDetector, ReconstructionDetector};
use crate::shared::config::DetectionConfig;
use crate::shared::errors::DetectionError;
use crate::shared::types::DataPoint;
use crate::shared::utils;
use tracing::debug;

/// Combines the isolation- and reconstruction-based signals into one
/// verdict per point. The final score is the stronger of the two
/// sub-scores; a point is anomalous when either sub-score crosses its
/// configured threshold.
pub struct OutlierScorer {
    isolation: IsolationDetector,
    reconstruction: ReconstructionDetector,
    isolation_threshold: f64,
    reconstruction_threshold: f64,
}

impl OutlierScorer {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            isolation: IsolationDetector::new(config.isolation_trees, config.isolation_seed),
            reconstruction: ReconstructionDetector,
            isolation_threshold: config.isolation_forest_threshold,
            reconstruction_threshold: config.autoencoder_threshold,
        }
    }

    /// Score a batch 1:1 and order-preserving. Mixed feature arity within
    /// one batch would corrupt the partitioning math and is rejected
    /// up front.
    pub fn score(&self, points: &[DataPoint]) -> Result<Vec<AnomalyResult>, DetectionError> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let arity = points[0].features.len();
        for p in points {
            if p.features.len() != arity {
                return Err(DetectionError::FeatureArityMismatch {
                    id: p.id.clone(),
                    expected: arity,
                    found: p.features.len(),
                });
            }
        }

        let features: Vec<Vec<f64>> = points.iter().map(|p| p.features.clone()).collect();
        let isolation_scores = self.isolation.score(&features);
        let reconstruction_scores = self.reconstruction.score(&features);
        let stats = column_stats(&features);

        let results: Vec<AnomalyResult> = points
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let iso = isolation_scores[i];
                let recon = reconstruction_scores[i];
                AnomalyResult {
                    point_id: point.id.clone(),
                    is_anomaly: iso >= self.isolation_threshold
                        || recon >= self.reconstruction_threshold,
                    score: iso.max(recon).clamp(0.0, 1.0),
                    anomaly_type: dominant_dimension_type(&point.features, &stats),
                }
            })
            .collect();

        let flagged = results.iter().filter(|r| r.is_anomaly).count();
        debug!(total = points.len(), flagged, "outlier batch scored");
        Ok(results)
    }
}

/// Per-dimension mean and spread across the batch
fn column_stats(features: &[Vec<f64>]) -> Vec<(f64, f64)> {
    let dims = features.first().map(|f| f.len()).unwrap_or(0);
    (0..dims)
        .map(|d| {
            let column: Vec<f64> = features.iter().map(|f| f[d]).collect();
            (utils::mean(&column), utils::std_dev(&column))
        })
        .collect()
}

/// Category from the feature dimension deviating most from the batch:
/// dimension 0 holds prices, dimension 1 quantities, anything beyond is a
/// generic feature
fn dominant_dimension_type(point: &[f64], stats: &[(f64, f64)]) -> AnomalyType {
    if stats.is_empty() {
        return AnomalyType::FeatureOutlier;
    }

    let mut best_dim = 0;
    let mut best_z = f64::NEG_INFINITY;
    for (d, (mean, std)) in stats.iter().enumerate() {
        let z = if *std > f64::EPSILON {
            ((point[d] - mean) / std).abs()
        } else {
            0.0
        };
        if z > best_z {
            best_z = z;
            best_dim = d;
        }
    }

    match best_dim {
        0 => AnomalyType::PriceOutlier,
        1 => AnomalyType::QuantityOutlier,
        _ => AnomalyType::FeatureOutlier,
    }
}
