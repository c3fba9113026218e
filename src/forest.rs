//! Random forest regressor.
//!
//! Each tree is a CART regression tree grown on a bootstrap sample of the
//! training rows. Splits minimise the summed squared error of the two
//! children; leaves predict the mean target of their rows. The forest
//! prediction is the mean over trees.
//!
//! Tree `i` is seeded with `seed + i`, so a forest fitted twice on the same
//! data with the same configuration is identical.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, Result};

// ---

/// Configuration for the random forest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Nodes with fewer rows than this become leaves
    pub min_samples_split: usize,
    /// Features tried per split; `None` tries all of them
    pub max_features: Option<usize>,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Regression tree in array representation; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct Grower<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    config: &'a ForestConfig,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl RegressionTree {
    // ---
    /// Grow a tree on the rows listed in `rows` (repeats allowed).
    fn grow(x: &[Vec<f64>], y: &[f64], rows: Vec<usize>, config: &ForestConfig, seed: u64) -> Self {
        // ---
        let mut grower = Grower {
            x,
            y,
            config,
            rng: StdRng::seed_from_u64(seed),
            nodes: Vec::new(),
        };
        grower.build(rows, 0);
        Self {
            nodes: grower.nodes,
        }
    }

    pub fn predict(&self, sample: &[f64]) -> f64 {
        // ---
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, idx: usize) -> usize {
        // ---
        match &self.nodes[idx] {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + self.depth_from(*left).max(self.depth_from(*right)),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Grower<'_> {
    // ---
    /// Build the subtree for `rows`, returning its node index.
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        // ---
        let node_index = self.nodes.len();
        let mean = rows.iter().map(|&r| self.y[r]).sum::<f64>() / rows.len() as f64;

        // Reserve the slot; children are pushed after it.
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= self.config.max_depth || rows.len() < self.config.min_samples_split.max(2) {
            return node_index;
        }

        let Some((feature, threshold)) = self.best_split(&rows) else {
            return node_index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| self.x[r][feature] <= threshold);

        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[node_index] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_index
    }

    /// Feature and threshold with the lowest child squared error, if any
    /// split improves on the parent.
    fn best_split(&mut self, rows: &[usize]) -> Option<(usize, f64)> {
        // ---
        let n_features = self.x[rows[0]].len();
        let candidates = self.candidate_features(n_features);

        let n = rows.len() as f64;
        let total: f64 = rows.iter().map(|&r| self.y[r]).sum();
        let total_sq: f64 = rows.iter().map(|&r| self.y[r] * self.y[r]).sum();
        let parent_sse = total_sq - total * total / n;

        let mut best: Option<(usize, f64)> = None;
        let mut best_sse = parent_sse - 1e-12;

        let mut order = rows.to_vec();
        for feature in candidates {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..order.len() {
                let y = self.y[order[k - 1]];
                left_sum += y;
                left_sq += y * y;

                let lo = self.x[order[k - 1]][feature];
                let hi = self.x[order[k]][feature];
                if lo == hi {
                    continue;
                }

                let nl = k as f64;
                let nr = n - nl;
                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / nl) + (right_sq - right_sum * right_sum / nr);

                if sse < best_sse {
                    best_sse = sse;
                    best = Some((feature, lo + (hi - lo) / 2.0));
                }
            }
        }

        best
    }

    fn candidate_features(&mut self, n_features: usize) -> Vec<usize> {
        // ---
        match self.config.max_features {
            Some(k) if k > 0 && k < n_features => {
                let mut picked = rand::seq::index::sample(&mut self.rng, n_features, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        }
    }
}

/// Bootstrap-aggregated regression trees.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    // ---
    /// Fit the forest on row-major samples `x` with targets `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &ForestConfig) -> Result<Self> {
        // ---
        if x.is_empty() || x.len() != y.len() {
            return Err(PipelineError::InsufficientTrainingData);
        }
        let n_features = x[0].len();
        let n = x.len();

        let trees = (0..config.n_trees.max(1))
            .map(|i| {
                let seed = config.seed.wrapping_add(i as u64);
                let mut rng = StdRng::seed_from_u64(seed);
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::grow(x, y, rows, config, rng.gen())
            })
            .collect();

        Ok(Self { trees, n_features })
    }

    /// Mean prediction over all trees.
    pub fn predict(&self, sample: &[f64]) -> f64 {
        // ---
        debug_assert_eq!(sample.len(), self.n_features);
        self.trees.iter().map(|t| t.predict(sample)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn predict_many(&self, samples: &[Vec<f64>]) -> Vec<f64> {
        samples.iter().map(|s| self.predict(s)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Mean absolute error; `None` for empty or mismatched inputs.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    // ---
    if actual.is_empty() || actual.len() != predicted.len() {
        return None;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    Some(sum / actual.len() as f64)
}
