//! Transaction-graph structural analysis

use super::{AnomalyResult, AnomalyType};
use crate::shared::types::TransactionNode;
use crate::shared::utils;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

const SHARED_ACCOUNT_SCORE: f64 = 0.9;
const CIRCULAR_PAYMENT_SCORE: f64 = 0.95;

/// Detects structural fraud signatures in a payment batch: settlement
/// accounts shared across vendors, balanced circular payment chains, and
/// anomalous vendor-pair concentration
pub struct GraphAnalyzer {
    max_cycle_hops: usize,
    amount_tolerance: f64,
    concentration_z: f64,
}

impl GraphAnalyzer {
    pub fn new(max_cycle_hops: usize, amount_tolerance: f64, concentration_z: f64) -> Self {
        Self {
            max_cycle_hops,
            amount_tolerance,
            concentration_z,
        }
    }

    /// Run all three structural checks. A clean or empty batch yields an
    /// empty result.
    pub fn analyze(&self, transactions: &[TransactionNode]) -> Vec<AnomalyResult> {
        let mut results = Vec::new();
        self.shared_accounts(transactions, &mut results);
        self.circular_payments(transactions, &mut results);
        self.vendor_concentration(transactions, &mut results);
        debug!(
            total = transactions.len(),
            findings = results.len(),
            "transaction graph analyzed"
        );
        results
    }

    /// Any settlement account referenced by more than one distinct vendor
    /// flags every transaction on that account
    fn shared_accounts(&self, transactions: &[TransactionNode], out: &mut Vec<AnomalyResult>) {
        let mut by_account: BTreeMap<&str, (HashSet<&str>, Vec<usize>)> = BTreeMap::new();
        for (i, tx) in transactions.iter().enumerate() {
            if let Some(account) = tx.bank_account.as_deref() {
                let entry = by_account.entry(account).or_default();
                entry.0.insert(tx.vendor_id.as_str());
                entry.1.push(i);
            }
        }

        for (vendors, indices) in by_account.values() {
            if vendors.len() > 1 {
                for &i in indices {
                    out.push(AnomalyResult {
                        point_id: transactions[i].id.clone(),
                        is_anomaly: true,
                        score: SHARED_ACCOUNT_SCORE,
                        anomaly_type: AnomalyType::SharedBankAccount,
                    });
                }
            }
        }
    }

    /// Bounded depth-first search for directed vendor cycles whose edge
    /// amounts are roughly balanced. Explicit stack, no recursion.
    fn circular_payments(&self, transactions: &[TransactionNode], out: &mut Vec<AnomalyResult>) {
        // edge list over inter-vendor transfers only
        let mut edges: Vec<(&str, &str, f64, usize)> = Vec::new();
        let mut adjacency: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, tx) in transactions.iter().enumerate() {
            if let Some(target) = tx.target_vendor_id.as_deref() {
                if target != tx.vendor_id {
                    adjacency
                        .entry(tx.vendor_id.as_str())
                        .or_default()
                        .push(edges.len());
                    edges.push((tx.vendor_id.as_str(), target, tx.amount, i));
                }
            }
        }
        if edges.is_empty() {
            return;
        }

        let mut starts: Vec<&str> = adjacency.keys().copied().collect();
        starts.sort_unstable();

        let mut flagged: HashSet<usize> = HashSet::new();
        for &start in &starts {
            // frames hold (vendor, next-edge cursor); path holds the edges taken
            let mut frames: Vec<(&str, usize)> = vec![(start, 0)];
            let mut path: Vec<usize> = Vec::new();
            let mut on_path: HashSet<&str> = HashSet::new();
            on_path.insert(start);

            while let Some(&(vendor, cursor)) = frames.last() {
                let next_edge = adjacency
                    .get(vendor)
                    .and_then(|list| list.get(cursor))
                    .copied();

                match next_edge {
                    Some(edge) => {
                        if let Some(frame) = frames.last_mut() {
                            frame.1 += 1;
                        }
                        let (_, target, _, _) = edges[edge];
                        if target == start {
                            if path.is_empty() {
                                continue; // a 1-hop loop is not a chain
                            }
                            let cycle: Vec<usize> =
                                path.iter().copied().chain(std::iter::once(edge)).collect();
                            if cycle.len() <= self.max_cycle_hops
                                && is_canonical(start, &cycle, &edges)
                                && self.balanced(&cycle, &edges)
                            {
                                flagged.extend(cycle.iter().map(|&e| edges[e].3));
                            }
                        } else if !on_path.contains(target) && path.len() + 1 < self.max_cycle_hops
                        {
                            frames.push((target, 0));
                            path.push(edge);
                            on_path.insert(target);
                        }
                    }
                    None => {
                        frames.pop();
                        if path.pop().is_some() {
                            on_path.remove(vendor);
                        }
                    }
                }
            }
        }

        let mut indices: Vec<usize> = flagged.into_iter().collect();
        indices.sort_unstable();
        for i in indices {
            out.push(AnomalyResult {
                point_id: transactions[i].id.clone(),
                is_anomaly: true,
                score: CIRCULAR_PAYMENT_SCORE,
                anomaly_type: AnomalyType::CircularPayment,
            });
        }
    }

    fn balanced(&self, cycle: &[usize], edges: &[(&str, &str, f64, usize)]) -> bool {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &e in cycle {
            let amount = edges[e].2;
            lo = lo.min(amount);
            hi = hi.max(amount);
        }
        hi > 0.0 && (hi - lo) <= self.amount_tolerance * hi
    }

    /// A vendor pair whose transfer count or total amount is a z-score
    /// outlier against the cross-pair distribution flags its transactions
    fn vendor_concentration(&self, transactions: &[TransactionNode], out: &mut Vec<AnomalyResult>) {
        let mut pairs: BTreeMap<(&str, &str), (usize, f64, Vec<usize>)> = BTreeMap::new();
        for (i, tx) in transactions.iter().enumerate() {
            if let Some(target) = tx.target_vendor_id.as_deref() {
                let entry = pairs
                    .entry((tx.vendor_id.as_str(), target))
                    .or_insert((0, 0.0, Vec::new()));
                entry.0 += 1;
                entry.1 += tx.amount;
                entry.2.push(i);
            }
        }
        // a distribution over fewer than three pairs is not trustworthy
        if pairs.len() < 3 {
            return;
        }

        let counts: Vec<f64> = pairs.values().map(|(c, _, _)| *c as f64).collect();
        let totals: Vec<f64> = pairs.values().map(|(_, t, _)| *t).collect();
        let (count_mean, count_std) = (utils::mean(&counts), utils::std_dev(&counts));
        let (total_mean, total_std) = (utils::mean(&totals), utils::std_dev(&totals));

        for (count, total, indices) in pairs.values() {
            let z_count = if count_std > f64::EPSILON {
                (*count as f64 - count_mean) / count_std
            } else {
                0.0
            };
            let z_total = if total_std > f64::EPSILON {
                (total - total_mean) / total_std
            } else {
                0.0
            };
            let z = z_count.max(z_total);
            if z >= self.concentration_z {
                for &i in indices {
                    out.push(AnomalyResult {
                        point_id: transactions[i].id.clone(),
                        is_anomaly: true,
                        score: utils::sigmoid_unit(z),
                        anomaly_type: AnomalyType::UnusualVendorRelationship,
                    });
                }
            }
        }
    }
}

/// Report each cycle once: only from its lexicographically smallest vendor
fn is_canonical(start: &str, cycle: &[usize], edges: &[(&str, &str, f64, usize)]) -> bool {
    cycle.iter().all(|&e| edges[e].0 >= start)
}
