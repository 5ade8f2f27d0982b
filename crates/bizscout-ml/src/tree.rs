use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::MlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; `None` tries all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// CART regression tree stored as a flat node array; node 0 is the root and
/// samples with `x[feature] <= threshold` go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grows a tree over `samples` (row indices, repeats allowed) and returns
    /// it with its normalized impurity-decrease importances.
    pub fn fit<R: Rng>(
        x: &[Vec<f64>],
        y: &[f64],
        samples: &[usize],
        config: &TreeConfig,
        rng: &mut R,
    ) -> Result<(Self, Vec<f64>), MlError> {
        let width = x.first().map_or(0, Vec::len);
        if width == 0 || x.len() != y.len() {
            return Err(MlError::InvalidInput(
                "training matrix is empty or misaligned with targets".to_string(),
            ));
        }
        if let Some(bad) = x.iter().find(|row| row.len() != width) {
            return Err(MlError::FeatureMismatch {
                expected: width,
                got: bad.len(),
            });
        }
        if samples.is_empty() || samples.iter().any(|&i| i >= x.len()) {
            return Err(MlError::InvalidInput(
                "sample indices are empty or out of range".to_string(),
            ));
        }

        let mut builder = Builder {
            x,
            y,
            width,
            config,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; width],
        };
        let mut samples = samples.to_vec();
        builder.grow(&mut samples, 0);

        let mut importances = builder.importances;
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        Ok((
            Self {
                nodes: builder.nodes,
            },
            importances,
        ))
    }

    pub fn predict(&self, row: &[f64]) -> Result<f64, MlError> {
        let mut idx = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).ok_or(MlError::FeatureMismatch {
                        expected: feature + 1,
                        got: row.len(),
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(MlError::CorruptModel(format!(
                        "node {idx} does not exist"
                    )))
                }
            }
        }
        Err(MlError::CorruptModel("tree traversal did not terminate".to_string()))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize, guard: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) if guard > 0 => {
                    1 + walk(nodes, *left, guard - 1).max(walk(nodes, *right, guard - 1))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0, self.nodes.len())
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitChoice {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a, R> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    width: usize,
    config: &'a TreeConfig,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

// Row indices and feature ids are validated in `RegressionTree::fit`.
#[allow(clippy::indexing_slicing, clippy::cast_precision_loss)]
impl<R: Rng> Builder<'_, R> {
    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let n = samples.len();
        let (sum, sum_sq) = samples.iter().fold((0.0, 0.0), |(s, q), &i| {
            let t = self.y[i];
            (s + t, q + t * t)
        });
        let mean = sum / n as f64;
        let sse = (sum_sq - sum * sum / n as f64).max(0.0);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let min_leaf = self.config.min_samples_leaf.max(1);
        if depth >= self.config.max_depth
            || n < self.config.min_samples_split
            || n < 2 * min_leaf
            || sse <= 1e-12
        {
            return id;
        }

        let Some(choice) = self.best_split(samples, sum, sum_sq, sse, min_leaf) else {
            return id;
        };

        let mut mid = 0;
        for k in 0..n {
            if self.x[samples[k]][choice.feature] <= choice.threshold {
                samples.swap(mid, k);
                mid += 1;
            }
        }
        self.importances[choice.feature] += choice.gain;

        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[id] = Node::Split {
            feature: choice.feature,
            threshold: choice.threshold,
            left,
            right,
        };
        id
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        match self.config.max_features {
            Some(k) if k > 0 && k < self.width => {
                let mut picked = sample(&mut *self.rng, self.width, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..self.width).collect(),
        }
    }

    fn best_split(
        &mut self,
        samples: &[usize],
        sum: f64,
        sum_sq: f64,
        sse: f64,
        min_leaf: usize,
    ) -> Option<SplitChoice> {
        let n = samples.len();
        let mut best: Option<SplitChoice> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in self.candidate_features() {
            pairs.clear();
            pairs.extend(samples.iter().map(|&i| (self.x[i][feature], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for (pos, window) in pairs.windows(2).enumerate() {
                let [(value, target), (next_value, _)] = [window[0], window[1]];
                left_sum += target;
                left_sq += target * target;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf || value >= next_value {
                    continue;
                }

                let right_sum = sum - left_sum;
                let right_sq = sum_sq - left_sq;
                let sse_left = (left_sq - left_sum * left_sum / n_left as f64).max(0.0);
                let sse_right = (right_sq - right_sum * right_sum / n_right as f64).max(0.0);
                let gain = sse - sse_left - sse_right;

                if best.map_or(gain > 1e-12, |b| gain > b.gain + 1e-12) {
                    let mut threshold = value + (next_value - value) / 2.0;
                    if threshold >= next_value {
                        threshold = value;
                    }
                    best = Some(SplitChoice {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }
}
