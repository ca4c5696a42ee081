// ============================================================
// ISOLATION FOREST
// ============================================================
// One-feature isolation forest: random trees over random subsamples,
// where short average paths mean easy-to-isolate points.

use rand::seq::index;
use rand::Rng;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted forest over a single numeric feature.
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Grow `n_trees` trees, each on `min(max_samples, values.len())` values
    /// drawn without replacement.
    ///
    /// `values` must hold at least two values.
    pub fn fit<R: Rng>(
        values: &[f64],
        n_trees: usize,
        max_samples: usize,
        rng: &mut R,
    ) -> Self {
        let sample_size = max_samples.min(values.len()).max(2);
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let trees = (0..n_trees)
            .map(|_| {
                let sample: Vec<f64> = index::sample(rng, values.len(), sample_size)
                    .into_iter()
                    .map(|i| values[i])
                    .collect();
                grow(sample, 0, height_limit, rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    /// Anomaly score in (0, 1]; values near 1 are isolated quickly.
    pub fn score(&self, value: f64) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let mean_path = self
            .trees
            .iter()
            .map(|tree| path_length(tree, value, 0))
            .sum::<f64>()
            / self.trees.len() as f64;
        2f64.powf(-mean_path / average_path_length(self.sample_size))
    }
}

fn grow<R: Rng>(values: Vec<f64>, depth: usize, limit: usize, rng: &mut R) -> Node {
    if depth >= limit || values.len() <= 1 {
        return Node::Leaf { size: values.len() };
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min >= max {
        return Node::Leaf { size: values.len() };
    }

    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<f64>, Vec<f64>) = values.into_iter().partition(|&v| v <= threshold);

    Node::Split {
        threshold,
        left: Box::new(grow(left, depth + 1, limit, rng)),
        right: Box::new(grow(right, depth + 1, limit, rng)),
    }
}

fn path_length(node: &Node, value: f64, depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            threshold,
            left,
            right,
        } => {
            let next = if value <= *threshold { left } else { right };
            path_length(next, value, depth + 1)
        }
    }
}

/// Average path length of an unsuccessful binary search tree lookup
/// over `n` points, used to normalise path lengths.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Percentile with linear interpolation between closest ranks.
/// `values` must be sorted ascending and non-empty.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.2448).abs() < 1e-3, "c(256) = {}", c256);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(percentile(&[7.0], 1.0), 7.0);
    }

    #[test]
    fn test_outlier_scores_higher() {
        let mut values: Vec<f64> = (0..200).map(|i| 100.0 + (i % 20) as f64).collect();
        values.push(5000.0);
        let mut rng = ChaCha20Rng::seed_from_u64(7);

        let forest = IsolationForest::fit(&values, 50, 64, &mut rng);

        let outlier = forest.score(5000.0);
        let inlier = forest.score(110.0);
        assert!(outlier > inlier, "outlier {} vs inlier {}", outlier, inlier);
        assert!(outlier > 0.0 && outlier <= 1.0);
    }
}
