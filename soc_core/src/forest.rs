//! Random forest regressor.
//!
//! Each tree is grown on a bootstrap resample of the training rows and splits
//! on the feature/threshold pair that leaves the least squared error in its
//! children. Trees grow until their leaves are pure unless `max_depth` stops
//! them. The forest predicts the mean of its trees.
//!
//! A feature that is constant over the training rows never separates any
//! rows, so it is never split on and ends with zero importance.
use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SocError;

/// Squared error at or below which a node counts as pure.
const PURE_SSE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    /// Nodes with fewer rows become leaves.
    pub min_samples_split: usize,
    /// Seed for the bootstrap resampling.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` go to `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

/// Node arena rooted at index 0. Children always sit after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().unwrap_or(f64::NAN);
                    let next = if v <= *threshold { *left } else { *right };
                    if next <= i {
                        return f64::NAN;
                    }
                    i = next;
                }
                None => return f64::NAN,
            }
        }
    }

    /// Structural check for trees read from disk.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        let len = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("leaf {i} holds non-finite value {value}"));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {i} splits on feature {feature} of {n_features}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i} has non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= len {
                            return Err(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit `params.n_trees` trees on `(x, y)`.
    ///
    /// Returns the forest and its impurity-based feature importances, which
    /// sum to 1 unless no tree ever split.
    pub fn fit<R: AsRef<[f64]>>(
        x: &[R],
        y: &[f64],
        params: &ForestParams,
    ) -> Result<(Self, Vec<f64>), SocError> {
        let n = x.len();
        if n == 0 || n != y.len() {
            return Err(SocError::Model(format!(
                "cannot fit a forest on {n} rows and {} targets",
                y.len()
            )));
        }
        if params.n_trees == 0 {
            return Err(SocError::Model("forest needs at least one tree".into()));
        }
        let n_features = x[0].as_ref().len();
        if x.iter().any(|row| row.as_ref().len() != n_features) {
            return Err(SocError::Model("feature rows differ in length".into()));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut importances = vec![0.0; n_features];
        for _ in 0..params.n_trees {
            let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let (tree, tree_imp) = Grower::new(x, y, params, n_features).grow(sample);
            let total: f64 = tree_imp.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(&tree_imp) {
                    *acc += v / total;
                }
            }
            trees.push(tree);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        Ok((Self { trees }, importances))
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn predict(&self, x: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        self.trees.iter().map(|t| t.predict(x)).sum::<f64>() / self.trees.len() as f64
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    children_sse: f64,
}

struct Grower<'a, R> {
    x: &'a [R],
    y: &'a [f64],
    params: &'a ForestParams,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

impl<'a, R: AsRef<[f64]>> Grower<'a, R> {
    fn new(x: &'a [R], y: &'a [f64], params: &'a ForestParams, n_features: usize) -> Self {
        Self {
            x,
            y,
            params,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        }
    }

    fn value(&self, row: usize, feature: usize) -> f64 {
        self.x[row].as_ref()[feature]
    }

    fn grow(mut self, rows: Vec<usize>) -> (RegressionTree, Vec<f64>) {
        self.nodes.push(TreeNode::Leaf { value: 0.0 });
        let mut stack = vec![(0_usize, rows, 0_usize)];
        while let Some((slot, rows, depth)) = stack.pop() {
            let (mean, sse) = node_stats(self.y, &rows);
            let may_split = rows.len() >= self.params.min_samples_split
                && self.params.max_depth.is_none_or(|d| depth < d)
                && sse > PURE_SSE;
            match may_split.then(|| self.best_split(&rows)).flatten() {
                Some(split) => {
                    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                        .iter()
                        .partition(|&&r| self.value(r, split.feature) <= split.threshold);
                    let left = self.nodes.len();
                    self.nodes.push(TreeNode::Leaf { value: 0.0 });
                    self.nodes.push(TreeNode::Leaf { value: 0.0 });
                    self.nodes[slot] = TreeNode::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right: left + 1,
                    };
                    self.importances[split.feature] += (sse - split.children_sse).max(0.0);
                    stack.push((left + 1, right_rows, depth + 1));
                    stack.push((left, left_rows, depth + 1));
                }
                None => self.nodes[slot] = TreeNode::Leaf { value: mean },
            }
        }
        (RegressionTree { nodes: self.nodes }, self.importances)
    }

    /// Lowest children-SSE threshold over all features, `None` when every
    /// feature is constant over `rows`.
    #[allow(clippy::cast_precision_loss)]
    fn best_split(&self, rows: &[usize]) -> Option<Split> {
        let n = rows.len();
        let total: f64 = rows.iter().map(|&r| self.y[r]).sum();
        let total_sq: f64 = rows.iter().map(|&r| self.y[r] * self.y[r]).sum();
        let mut order = rows.to_vec();
        let mut best: Option<Split> = None;
        for feature in 0..self.importances.len() {
            order.sort_by(|&a, &b| self.value(a, feature).total_cmp(&self.value(b, feature)));
            let (mut sum_l, mut sq_l) = (0.0, 0.0);
            for k in 1..n {
                let yl = self.y[order[k - 1]];
                sum_l += yl;
                sq_l += yl * yl;
                let a = self.value(order[k - 1], feature);
                let b = self.value(order[k], feature);
                if a.partial_cmp(&b) != Some(Ordering::Less) {
                    continue;
                }
                let (n_l, n_r) = (k as f64, (n - k) as f64);
                let sse_l = (sq_l - sum_l * sum_l / n_l).max(0.0);
                let sum_r = total - sum_l;
                let sse_r = ((total_sq - sq_l) - sum_r * sum_r / n_r).max(0.0);
                let children_sse = sse_l + sse_r;
                if best.as_ref().is_none_or(|s| children_sse < s.children_sse) {
                    let mid = a + (b - a) / 2.0;
                    best = Some(Split {
                        feature,
                        threshold: if mid < b { mid } else { a },
                        children_sse,
                    });
                }
            }
        }
        best
    }
}

#[allow(clippy::cast_precision_loss)]
fn node_stats(y: &[f64], rows: &[usize]) -> (f64, f64) {
    let mean = rows.iter().map(|&r| y[r]).sum::<f64>() / rows.len() as f64;
    let sse = rows.iter().map(|&r| (y[r] - mean).powi(2)).sum();
    (mean, sse)
}
