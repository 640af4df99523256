//! Anomaly detection facade

use super::{AnomalyResult, GraphAnalyzer, OutlierScorer};
use crate::shared::config::DetectionConfig;
use crate::shared::errors::{ConfigError, DetectionError};
use crate::shared::types::{DataPoint, TransactionNode};
use tracing::info;

/// Public entry point combining the statistical ensemble and the
/// transaction-graph analysis. Configuration is validated eagerly and
/// immutable afterwards; every call is an independent pure computation.
pub struct AnomalyDetector {
    scorer: OutlierScorer,
    graph: GraphAnalyzer,
}

impl AnomalyDetector {
    pub fn new(config: DetectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            scorer: OutlierScorer::new(&config),
            graph: GraphAnalyzer::new(
                config.cycle_max_hops,
                config.cycle_amount_tolerance,
                config.concentration_z_threshold,
            ),
        })
    }

    /// Score a batch of data points for statistical outliers
    pub fn detect(&self, points: &[DataPoint]) -> Result<Vec<AnomalyResult>, DetectionError> {
        let results = self.scorer.score(points)?;
        info!(
            total = points.len(),
            flagged = results.iter().filter(|r| r.is_anomaly).count(),
            "outlier detection complete"
        );
        Ok(results)
    }

    /// Analyze the transaction graph for structural fraud signatures
    pub fn detect_graph_anomalies(&self, transactions: &[TransactionNode]) -> Vec<AnomalyResult> {
        let results = self.graph.analyze(transactions);
        info!(
            total = transactions.len(),
            findings = results.len(),
            "graph anomaly detection complete"
        );
        results
    }
}
