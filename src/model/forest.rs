use ndarray::Array2;
use rand::{Rng, rngs::StdRng, seq::index};

use crate::error::{DetectionError, Result};

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// Isolation forest (Liu et al. 2008): an ensemble of random axis-parallel
/// partition trees. Samples that separate from the population in few splits
/// get short paths and scores toward 1; samples buried in the population get
/// scores near or below 0.5.
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    pub fn fit(
        population: &Array2<f64>,
        tree_count: usize,
        sample_size: usize,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if population.nrows() < 2 {
            return Err(DetectionError::InvalidParameter(
                "isolation forest needs at least 2 samples".into(),
            ));
        }
        if tree_count == 0 {
            return Err(DetectionError::InvalidParameter(
                "isolation forest needs at least one tree".into(),
            ));
        }

        let sample_size = sample_size.clamp(2, population.nrows());
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let trees = (0..tree_count)
            .map(|_| {
                let subsample = index::sample(rng, population.nrows(), sample_size).into_vec();
                Self::build_node(population, subsample, 0, height_limit, rng)
            })
            .collect();

        Ok(Self { trees, sample_size })
    }

    fn build_node(
        population: &Array2<f64>,
        indices: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> Node {
        if depth >= height_limit || indices.len() <= 1 {
            return Node::Leaf { size: indices.len() };
        }

        // Only features that still vary within this node are splittable.
        let splittable: Vec<(usize, f64, f64)> = (0..population.ncols())
            .filter_map(|feature| {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for &i in &indices {
                    min = min.min(population[[i, feature]]);
                    max = max.max(population[[i, feature]]);
                }
                (max > min).then_some((feature, min, max))
            })
            .collect();

        if splittable.is_empty() {
            return Node::Leaf { size: indices.len() };
        }

        let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
        let threshold = rng.gen_range(min..max);
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| population[[i, feature]] < threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(Self::build_node(
                population,
                left,
                depth + 1,
                height_limit,
                rng,
            )),
            right: Box::new(Self::build_node(
                population,
                right,
                depth + 1,
                height_limit,
                rng,
            )),
        }
    }

    /// Anomaly score in (0, 1]; higher means the sample isolates faster than
    /// the fitted population.
    pub fn score(&self, sample: &[f64]) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| Self::path_length(tree, sample, 0.0))
            .sum();
        let mean_path = total / self.trees.len() as f64;

        2f64.powf(-mean_path / expected_path_length(self.sample_size))
    }

    fn path_length(node: &Node, sample: &[f64], depth: f64) -> f64 {
        match node {
            Node::Leaf { size } => depth + expected_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let child = if sample[*feature] < *threshold {
                    left
                } else {
                    right
                };
                Self::path_length(child, sample, depth + 1.0)
            }
        }
    }
}

/// Expected unsuccessful-search path length in a BST of n points, the
/// normalizer from the isolation forest paper.
fn expected_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn clustered_population() -> Array2<f64> {
        // Tight cluster around (0.5, 0.5) from a fixed lattice.
        let mut data = Vec::new();
        for i in 0..16 {
            for j in 0..16 {
                data.push(0.45 + i as f64 * 0.00625);
                data.push(0.45 + j as f64 * 0.00625);
            }
        }
        Array2::from_shape_vec((256, 2), data).unwrap()
    }

    #[test]
    fn test_outlier_scores_above_inlier() {
        let population = clustered_population();
        let mut rng = StdRng::seed_from_u64(11);
        let forest = IsolationForest::fit(&population, 100, 128, &mut rng).unwrap();

        let inlier = forest.score(&[0.5, 0.5]);
        let outlier = forest.score(&[8.0, -3.0]);

        assert!(outlier > inlier, "outlier {outlier} <= inlier {inlier}");
        assert!(outlier > 0.6);
        assert!((0.0..=1.0).contains(&inlier));
        assert!((0.0..=1.0).contains(&outlier));
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let population = clustered_population();
        let mut rng = StdRng::seed_from_u64(3);
        let forest = IsolationForest::fit(&population, 50, 64, &mut rng).unwrap();

        let first = forest.score(&[0.7, 0.2]);
        let second = forest.score(&[0.7, 0.2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_expected_path_length_monotonic() {
        assert_eq!(expected_path_length(1), 0.0);
        assert!(expected_path_length(16) > expected_path_length(4));
        assert!(expected_path_length(256) > expected_path_length(16));
    }

    #[test]
    fn test_rejects_degenerate_population() {
        let population = Array2::<f64>::zeros((1, 3));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(IsolationForest::fit(&population, 10, 8, &mut rng).is_err());
    }
}
