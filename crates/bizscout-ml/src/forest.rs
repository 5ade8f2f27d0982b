use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::MlError;
use crate::tree::{RegressionTree, TreeConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub tree: TreeConfig,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeConfig::default(),
            seed: 42,
        }
    }
}

/// Bagged ensemble of regression trees; the prediction is the tree mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &ForestConfig) -> Result<Self, MlError> {
        if config.n_trees == 0 {
            return Err(MlError::InvalidInput("forest needs at least one tree".to_string()));
        }
        let n = x.len();
        if n == 0 || n != y.len() {
            return Err(MlError::InvalidInput(format!(
                "{n} feature rows for {} targets",
                y.len()
            )));
        }
        let n_features = x.first().map_or(0, Vec::len);

        let mut master = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);
        let mut importances = vec![0.0; n_features];
        for _ in 0..config.n_trees {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let (tree, tree_importances) =
                RegressionTree::fit(x, y, &bootstrap, &config.tree, &mut rng)?;
            for (acc, v) in importances.iter_mut().zip(tree_importances) {
                *acc += v;
            }
            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        Ok(Self {
            trees,
            n_features,
            feature_importances: importances,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn predict(&self, row: &[f64]) -> Result<f64, MlError> {
        if row.len() != self.n_features {
            return Err(MlError::FeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(MlError::CorruptModel("forest has no trees".to_string()));
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub const fn n_features(&self) -> usize {
        self.n_features
    }
}
