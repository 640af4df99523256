//! Reconstruction-style outlier detection

use crate::shared::utils;

const POWER_ITERATIONS: usize = 50;

/// Low-rank linear approximation of the batch: centroid plus the dominant
/// variance direction. A point's score is its residual reconstruction
/// error, normalized against the batch spread.
pub struct ReconstructionDetector;

impl ReconstructionDetector {
    /// Score every point in input order. Batches too small to carry
    /// contrast (fewer than three points) score 0 across the board.
    pub fn score(&self, points: &[Vec<f64>]) -> Vec<f64> {
        let n = points.len();
        if n < 3 || points[0].is_empty() {
            return vec![0.0; n];
        }
        let dims = points[0].len();

        let centroid = centroid(points, dims);
        let principal = dominant_direction(points, &centroid, dims);

        let errors: Vec<f64> = points
            .iter()
            .map(|p| {
                let deviation: Vec<f64> =
                    p.iter().zip(centroid.iter()).map(|(x, c)| x - c).collect();
                match &principal {
                    Some(axis) => {
                        let along = dot(&deviation, axis);
                        let residual: Vec<f64> = deviation
                            .iter()
                            .zip(axis.iter())
                            .map(|(d, a)| d - along * a)
                            .collect();
                        norm(&residual)
                    }
                    None => norm(&deviation),
                }
            })
            .collect();

        let mean_err = utils::mean(&errors);
        let std_err = utils::std_dev(&errors);
        if std_err <= f64::EPSILON {
            return vec![0.0; n];
        }

        errors
            .iter()
            .map(|e| utils::sigmoid_unit((e - mean_err) / std_err))
            .collect()
    }
}

fn centroid(points: &[Vec<f64>], dims: usize) -> Vec<f64> {
    let mut c = vec![0.0; dims];
    for p in points {
        for (acc, v) in c.iter_mut().zip(p.iter()) {
            *acc += v;
        }
    }
    for v in c.iter_mut() {
        *v /= points.len() as f64;
    }
    c
}

/// Power iteration on the sample covariance; `None` when the batch has no
/// variance to speak of
fn dominant_direction(points: &[Vec<f64>], centroid: &[f64], dims: usize) -> Option<Vec<f64>> {
    let mut cov = vec![vec![0.0; dims]; dims];
    for p in points {
        for i in 0..dims {
            let di = p[i] - centroid[i];
            for j in 0..dims {
                cov[i][j] += di * (p[j] - centroid[j]);
            }
        }
    }
    let denom = (points.len() - 1) as f64;
    for row in cov.iter_mut() {
        for v in row.iter_mut() {
            *v /= denom;
        }
    }

    let mut v = vec![1.0 / (dims as f64).sqrt(); dims];
    for _ in 0..POWER_ITERATIONS {
        let mut next = vec![0.0; dims];
        for i in 0..dims {
            for j in 0..dims {
                next[i] += cov[i][j] * v[j];
            }
        }
        let magnitude = norm(&next);
        if magnitude < 1e-12 {
            return None;
        }
        for x in next.iter_mut() {
            *x /= magnitude;
        }
        v = next;
    }
    Some(v)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_axis_point_scores_highest() {
        // bulk lies along y = x; one point sits off that axis
        let mut points: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, i as f64]).collect();
        points.push(vec![35.0, -5.0]);
        let scores = ReconstructionDetector.score(&points);
        let (best, _) = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(best, 30);
        assert!(scores[30] > 0.9);
    }

    #[test]
    fn test_identical_batch_scores_zero() {
        let scores = ReconstructionDetector.score(&vec![vec![4.0, 4.0, 4.0]; 20]);
        assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_small_batches_score_zero() {
        assert!(ReconstructionDetector.score(&[]).is_empty());
        assert_eq!(
            ReconstructionDetector.score(&[vec![1.0], vec![2.0]]),
            vec![0.0, 0.0]
        );
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let points: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 7) as f64, (i % 11) as f64, (i % 3) as f64])
            .collect();
        for score in ReconstructionDetector.score(&points) {
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
