//! Isolation forest: an ensemble of randomized partitioning trees.
//!
//! A point that is isolated after few random splits is unusual relative to
//! the training cloud. Per tree, the path length of a point is the depth of
//! the leaf it lands in plus the expected remaining depth of an unbuilt
//! subtree holding the leaf's row count. The ensemble score is
//! `-2^(-mean_path / c(max_samples))`, in `[-1, 0)`; lower is more anomalous.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Subsample cap per tree.
pub const DEFAULT_MAX_SAMPLES: usize = 256;
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Average path length of an unsuccessful BST search over `n` rows, `c(n)`.
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

#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub random_state: u64,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn fit(data: ArrayView2<f64>, rows: Vec<usize>, max_depth: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(data, rows, 0, max_depth, rng);
        tree
    }

    /// Grow the subtree for `rows`, returning its node index.
    fn grow(
        &mut self,
        data: ArrayView2<f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if rows.len() < 2 || depth >= max_depth {
            return idx;
        }

        // Only features that still vary inside this node can split it
        let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
            .filter_map(|feature| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    let v = data[[r, feature]];
                    (lo.min(v), hi.max(v))
                });
                (hi > lo).then_some((feature, lo, hi))
            })
            .collect();

        if candidates.is_empty() {
            return idx;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        // threshold in [lo, hi): the minimum goes left, the maximum goes right
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| data[[r, feature]] <= threshold);

        let left = self.grow(data, left_rows, depth + 1, max_depth, rng);
        let right = self.grow(data, right_rows, depth + 1, max_depth, rng);
        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    fn path_length(&self, x: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        let mut depth = 0usize;
        loop {
            match self.nodes[idx] {
                Node::Leaf { size } => return depth as f64 + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    max_samples: usize,
}

impl IsolationForest {
    /// Fit the ensemble on `data` (rows are observations).
    ///
    /// One seed per tree is drawn up front from `random_state`, so the forest
    /// is identical whatever the rayon pool size. `data` must have at least
    /// one row and `params.n_estimators` must be non-zero.
    pub fn fit(data: ArrayView2<f64>, params: &ForestParams) -> Self {
        let n_rows = data.nrows();
        let max_samples = params.max_samples.min(n_rows).max(1);
        let max_depth = (max_samples.max(2) as f64).log2().ceil() as usize;

        let mut master = ChaCha8Rng::seed_from_u64(params.random_state);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| master.gen()).collect();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let rows = index::sample(&mut rng, n_rows, max_samples).into_vec();
                IsolationTree::fit(data, rows, max_depth, &mut rng)
            })
            .collect();

        Self { trees, max_samples }
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Mean isolation depth of `x` across trees.
    pub fn mean_path_length(&self, x: ArrayView1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.path_length(x)).sum();
        total / self.trees.len() as f64
    }

    /// Anomaly score in `[-1, 0)`: around -0.5 for typical points, towards -1
    /// for points isolated near the root.
    pub fn score_samples(&self, x: ArrayView1<f64>) -> f64 {
        let norm = average_path_length(self.max_samples);
        if norm == 0.0 {
            // Single-row subsamples carry no depth information
            return -0.5;
        }
        -(2f64.powf(-self.mean_path_length(x) / norm))
    }

    /// Score every row of `data`.
    pub fn score_rows(&self, data: ArrayView2<f64>) -> Vec<f64> {
        (0..data.nrows())
            .into_par_iter()
            .map(|i| self.score_samples(data.row(i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{baseline_rng, generate_baseline};
    use ndarray::{arr1, Array2};

    fn params(random_state: u64) -> ForestParams {
        ForestParams {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
            random_state,
        }
    }

    #[test]
    fn average_path_length_reference_values() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn tree_height_is_capped() {
        let data = generate_baseline(500, &mut baseline_rng(Some(5)));
        let forest = IsolationForest::fit(data.view(), &params(42));
        assert_eq!(forest.n_estimators(), DEFAULT_N_ESTIMATORS);
        assert_eq!(forest.max_samples(), 256);

        // log2(256) = 8 levels, plus at most c(256) for a leaf at the cap
        let far = arr1(&[100.0, 100.0, 1e6, 0.0, 0.0, 100.0]);
        let path = forest.mean_path_length(far.view());
        assert!(path >= 1.0 && path <= 8.0 + average_path_length(256));
    }

    #[test]
    fn outliers_score_below_typical_points() {
        let data = generate_baseline(500, &mut baseline_rng(Some(5)));
        let forest = IsolationForest::fit(data.view(), &params(42));

        let typical = arr1(&[4.8, 0.9, 200.0, 0.0, 0.0, 0.08]);
        let outlier = arr1(&[7.9, 0.3, 1.0, 1.0, 1.0, 0.01]);
        let s_typical = forest.score_samples(typical.view());
        let s_outlier = forest.score_samples(outlier.view());

        assert!(s_outlier < s_typical, "{s_outlier} !< {s_typical}");
        assert!((-1.0..0.0).contains(&s_typical));
        assert!((-1.0..0.0).contains(&s_outlier));
    }

    #[test]
    fn same_seed_same_forest() {
        let data = generate_baseline(300, &mut baseline_rng(Some(9)));
        let a = IsolationForest::fit(data.view(), &params(42));
        let b = IsolationForest::fit(data.view(), &params(42));
        assert_eq!(a.score_rows(data.view()), b.score_rows(data.view()));
    }

    #[test]
    fn identical_rows_never_split() {
        let data = Array2::<f64>::ones((10, 6));
        let forest = IsolationForest::fit(data.view(), &params(1));
        let path = forest.mean_path_length(data.row(0));
        assert!((path - average_path_length(10)).abs() < 1e-12);
    }

    #[test]
    fn small_population_caps_subsample() {
        let data = generate_baseline(20, &mut baseline_rng(Some(2)));
        let forest = IsolationForest::fit(data.view(), &params(3));
        assert_eq!(forest.max_samples(), 20);
    }
}
