use bizscout_core::Dataset;
use bizscout_storage::BlobStore;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::encoder::Encoders;
use crate::error::MlError;
use crate::features::{FeatureAggregates, FeatureSpace, FeatureVector};
use crate::forest::{ForestConfig, RandomForest};
use crate::metrics::{ModelPerformance, TargetMetrics};
use crate::scaler::StandardScaler;

pub const DEMAND_MODEL_KEY: &str = "demand_model";
pub const COMPETITION_MODEL_KEY: &str = "competition_model";
pub const LABEL_ENCODERS_KEY: &str = "label_encoders";
pub const SCALER_KEY: &str = "scaler";
pub const FEATURE_AGGREGATES_KEY: &str = "feature_aggregates";

pub const MIN_TRAINING_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub forest: ForestConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Demand,
    Competition,
}

/// Shuffles `0..n` with `seed` and returns a `test` membership mask holding
/// `ceil(n * test_fraction)` rows, kept within `1..n`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn holdout_mask(n: usize, test_fraction: f64, seed: u64) -> Vec<bool> {
    if n < 2 {
        return vec![false; n];
    }
    let wanted = (n as f64 * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = wanted.clamp(1, n - 1);

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut mask = vec![false; n];
    for idx in order.into_iter().take(n_test) {
        if let Some(slot) = mask.get_mut(idx) {
            *slot = true;
        }
    }
    mask
}

/// The two regressors plus everything inference needs to rebuild features
/// exactly as they were at training time. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModelPair {
    pub demand_model: RandomForest,
    pub competition_model: RandomForest,
    pub features: FeatureSpace,
    pub scaler: StandardScaler,
}

impl TrainedModelPair {
    pub fn fit(dataset: &Dataset, config: &TrainConfig) -> Result<(Self, ModelPerformance), MlError> {
        if dataset.len() < MIN_TRAINING_ROWS {
            return Err(MlError::InsufficientData {
                rows: dataset.len(),
                required: MIN_TRAINING_ROWS,
            });
        }

        log::info!("preparing features for {} rows", dataset.len());
        let features = FeatureSpace::fit(dataset);
        let rows: Vec<FeatureVector> = dataset
            .iter()
            .map(|r| features.record_vector(r))
            .collect::<Result<_, _>>()?;

        let mask = holdout_mask(rows.len(), config.test_fraction, config.seed);
        let mut train_rows = Vec::new();
        let mut test_rows = Vec::new();
        let mut train_targets = (Vec::new(), Vec::new());
        let mut test_targets = (Vec::new(), Vec::new());
        for ((row, record), is_test) in rows.iter().zip(dataset.iter()).zip(&mask) {
            let (bucket, targets) = if *is_test {
                (&mut test_rows, &mut test_targets)
            } else {
                (&mut train_rows, &mut train_targets)
            };
            bucket.push(*row);
            targets.0.push(record.demand);
            targets.1.push(record.competition);
        }

        let scaler = StandardScaler::fit(&train_rows)?;
        let x_train = scale_all(&scaler, &train_rows)?;
        let x_test = scale_all(&scaler, &test_rows)?;

        log::info!("training demand model on {} rows", x_train.len());
        let demand_model = RandomForest::fit(&x_train, &train_targets.0, &config.forest)?;
        log::info!("training competition model on {} rows", x_train.len());
        let competition_model = RandomForest::fit(&x_train, &train_targets.1, &config.forest)?;

        let demand_pred = predict_all(&demand_model, &x_test)?;
        let competition_pred = predict_all(&competition_model, &x_test)?;
        let performance = ModelPerformance {
            demand: TargetMetrics::evaluate(&test_targets.0, &demand_pred),
            competition: TargetMetrics::evaluate(&test_targets.1, &competition_pred),
            train_rows: x_train.len(),
            test_rows: x_test.len(),
        };
        log::info!(
            "training complete: demand mae={} r2={} accuracy={}%, competition mae={} r2={} accuracy={}%",
            performance.demand.mae,
            performance.demand.r2,
            performance.demand.accuracy,
            performance.competition.mae,
            performance.competition.r2,
            performance.competition.accuracy,
        );

        Ok((
            Self {
                demand_model,
                competition_model,
                features,
                scaler,
            },
            performance,
        ))
    }

    /// Unclipped `(demand, competition)` model output for one input.
    pub fn predict_raw(
        &self,
        city: &str,
        category: &str,
        business: &str,
        investment: f64,
    ) -> Result<(f64, f64), MlError> {
        let raw = self.features.vector(city, category, business, investment)?;
        let scaled = self.scaler.transform(&raw)?;
        let demand = self.demand_model.predict(&scaled)?;
        let competition = self.competition_model.predict(&scaled)?;
        if !demand.is_finite() || !competition.is_finite() {
            return Err(MlError::CorruptModel(
                "model produced a non-finite prediction".to_string(),
            ));
        }
        Ok((demand, competition))
    }

    pub const fn model(&self, target: Target) -> &RandomForest {
        match target {
            Target::Demand => &self.demand_model,
            Target::Competition => &self.competition_model,
        }
    }

    pub fn save<S: BlobStore + ?Sized>(&self, store: &mut S) -> Result<(), MlError> {
        put(store, DEMAND_MODEL_KEY, &self.demand_model)?;
        put(store, COMPETITION_MODEL_KEY, &self.competition_model)?;
        put(store, LABEL_ENCODERS_KEY, &self.features.encoders)?;
        put(store, SCALER_KEY, &self.scaler)?;
        put(store, FEATURE_AGGREGATES_KEY, &self.features.aggregates)?;
        Ok(())
    }

    /// `Ok(None)` when any of the blobs is missing.
    pub fn load<S: BlobStore + ?Sized>(store: &S) -> Result<Option<Self>, MlError> {
        let Some(demand_model) = get::<RandomForest, _>(store, DEMAND_MODEL_KEY)? else {
            return Ok(None);
        };
        let Some(competition_model) = get::<RandomForest, _>(store, COMPETITION_MODEL_KEY)? else {
            return Ok(None);
        };
        let Some(encoders) = get::<Encoders, _>(store, LABEL_ENCODERS_KEY)? else {
            return Ok(None);
        };
        let Some(scaler) = get::<StandardScaler, _>(store, SCALER_KEY)? else {
            return Ok(None);
        };
        let Some(aggregates) = get::<FeatureAggregates, _>(store, FEATURE_AGGREGATES_KEY)? else {
            return Ok(None);
        };

        let widths = [
            demand_model.n_features(),
            competition_model.n_features(),
            scaler.width(),
        ];
        if let Some(bad) = widths.iter().find(|w| **w != crate::features::FEATURE_COUNT) {
            return Err(MlError::FeatureMismatch {
                expected: crate::features::FEATURE_COUNT,
                got: *bad,
            });
        }

        Ok(Some(Self {
            demand_model,
            competition_model,
            features: FeatureSpace {
                encoders,
                aggregates,
            },
            scaler,
        }))
    }
}

fn scale_all(scaler: &StandardScaler, rows: &[FeatureVector]) -> Result<Vec<Vec<f64>>, MlError> {
    rows.iter().map(|r| scaler.transform(r)).collect()
}

fn predict_all(model: &RandomForest, rows: &[Vec<f64>]) -> Result<Vec<f64>, MlError> {
    rows.iter().map(|r| model.predict(r)).collect()
}

fn put<S: BlobStore + ?Sized, T: Serialize>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), MlError> {
    let bytes = serde_json::to_vec(value)?;
    store.save(key, &bytes)?;
    Ok(())
}

fn get<T: DeserializeOwned, S: BlobStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<T>, MlError> {
    match store.load(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holdout_takes_ceiling_fraction() {
        let mask = holdout_mask(11, 0.2, 42);
        assert_eq!(mask.iter().filter(|t| **t).count(), 3);
        assert_eq!(mask, holdout_mask(11, 0.2, 42));
    }

    #[test]
    fn holdout_keeps_both_sides_non_empty() {
        assert_eq!(holdout_mask(2, 0.9, 1).iter().filter(|t| **t).count(), 1);
        assert_eq!(holdout_mask(5, 0.0, 1).iter().filter(|t| **t).count(), 1);
        assert!(holdout_mask(1, 0.2, 1).iter().all(|t| !*t));
    }
}
