use bizscout_core::{round_to, Dataset, PredictionQuality, PredictionResult, PredictionSource};
use bizscout_storage::BlobStore;

use crate::confidence::{ConfidenceEstimator, ConfidencePolicy};
use crate::error::MlError;
use crate::fallback::fallback_prediction;
use crate::features::FEATURE_NAMES;
use crate::metrics::ModelPerformance;
use crate::model::{Target, TrainConfig, TrainedModelPair};

pub const DEMAND_BOUNDS: (f64, f64) = (50.0, 100.0);
pub const COMPETITION_BOUNDS: (f64, f64) = (20.0, 80.0);

/// Predicts demand and competition for businesses that may not exist in the
/// dataset.
///
/// Starts untrained; [`train`](Self::train) or a successful
/// [`restore`](Self::restore) moves it to the trained state. `predict` works
/// in both states and answers from the static fallback table whenever the
/// models cannot.
#[derive(Debug)]
pub struct DemandCompetitionPredictor {
    models: Option<TrainedModelPair>,
    performance: Option<ModelPerformance>,
    confidence: ConfidenceEstimator,
}

impl Default for DemandCompetitionPredictor {
    fn default() -> Self {
        Self::new(ConfidencePolicy::default())
    }
}

impl DemandCompetitionPredictor {
    pub fn new(policy: ConfidencePolicy) -> Self {
        Self {
            models: None,
            performance: None,
            confidence: ConfidenceEstimator::new(policy),
        }
    }

    pub const fn is_trained(&self) -> bool {
        self.models.is_some()
    }

    pub const fn models(&self) -> Option<&TrainedModelPair> {
        self.models.as_ref()
    }

    /// Holdout metrics of the last `train`; `None` after a restore.
    pub const fn performance(&self) -> Option<&ModelPerformance> {
        self.performance.as_ref()
    }

    pub fn train(
        &mut self,
        dataset: &Dataset,
        config: &TrainConfig,
    ) -> Result<&TrainedModelPair, MlError> {
        let (models, performance) = TrainedModelPair::fit(dataset, config)?;
        self.performance = Some(performance);
        Ok(self.models.insert(models))
    }

    pub fn predict(
        &self,
        city: &str,
        category: &str,
        business: &str,
        investment: f64,
    ) -> PredictionResult {
        match self.try_predict(city, category, business, investment) {
            Ok(result) => result,
            Err(err) => {
                log::warn!("prediction for {business:?} ({category}, {city}) fell back: {err}");
                fallback_prediction(category)
            }
        }
    }

    pub fn try_predict(
        &self,
        city: &str,
        category: &str,
        business: &str,
        investment: f64,
    ) -> Result<PredictionResult, MlError> {
        let models = self.models.as_ref().ok_or(MlError::NotTrained)?;
        let (demand, competition) = models.predict_raw(city, category, business, investment)?;

        let demand = demand.clamp(DEMAND_BOUNDS.0, DEMAND_BOUNDS.1);
        let competition = competition.clamp(COMPETITION_BOUNDS.0, COMPETITION_BOUNDS.1);
        let confidence = self.confidence.next();

        Ok(PredictionResult {
            demand: round_to(demand, 1),
            competition: round_to(competition, 1),
            market_gap: round_to(demand - competition, 1),
            confidence: round_to(confidence, 2),
            quality: PredictionQuality::from_confidence(confidence),
            source: PredictionSource::Model,
        })
    }

    /// Top `top_n` features by importance, most important first. Empty when
    /// untrained.
    pub fn feature_importance(&self, target: Target, top_n: usize) -> Vec<(&'static str, f64)> {
        let Some(models) = &self.models else {
            return Vec::new();
        };
        let mut ranked: Vec<(&'static str, f64)> = FEATURE_NAMES
            .iter()
            .copied()
            .zip(models.model(target).feature_importances().iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_n);
        ranked
    }

    pub fn persist<S: BlobStore + ?Sized>(&self, store: &mut S) -> Result<(), MlError> {
        let models = self.models.as_ref().ok_or(MlError::NotTrained)?;
        models.save(store)?;
        log::info!("persisted trained models");
        Ok(())
    }

    /// Returns `Ok(false)` when the store lacks any of the model blobs; the
    /// caller is expected to train instead.
    pub fn restore<S: BlobStore + ?Sized>(&mut self, store: &S) -> Result<bool, MlError> {
        match TrainedModelPair::load(store)? {
            Some(models) => {
                log::info!("restored trained models from store");
                self.models = Some(models);
                self.performance = None;
                Ok(true)
            }
            None => {
                log::info!("no saved models found");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bizscout_core::BusinessRecord;

    use super::*;
    use crate::forest::ForestConfig;

    fn dataset() -> Dataset {
        let mut rows = Vec::new();
        for (i, city) in ["Pune", "Agra", "Kochi"].iter().enumerate() {
            for (j, (category, demand, competition)) in
                [("Food", 78.0, 62.0), ("Tech", 84.0, 52.0), ("Retail", 62.0, 72.0)]
                    .iter()
                    .enumerate()
            {
                for k in 0..3_u32 {
                    let bump = f64::from(k) * 2.0;
                    rows.push(BusinessRecord::new(
                        *city,
                        *category,
                        format!("{category} shop {k}"),
                        f64::from(u32::try_from(i * 3 + j).unwrap_or(0) + 1) * 250_000.0,
                        demand - bump,
                        competition + bump,
                    ));
                }
            }
        }
        Dataset::new(rows).expect("dataset")
    }

    fn quick_config() -> TrainConfig {
        TrainConfig {
            forest: ForestConfig {
                n_trees: 8,
                ..ForestConfig::default()
            },
            ..TrainConfig::default()
        }
    }

    #[test]
    fn untrained_predictor_falls_back() {
        let predictor = DemandCompetitionPredictor::default();
        assert!(!predictor.is_trained());
        let out = predictor.predict("Pune", "Tech", "Anything", 1e6);
        assert_eq!(out.source, PredictionSource::Fallback);
        assert_eq!((out.demand, out.competition), (80.0, 55.0));
        assert!(predictor.feature_importance(Target::Demand, 5).is_empty());
        assert!(matches!(
            predictor.try_predict("Pune", "Tech", "Anything", 1e6),
            Err(MlError::NotTrained)
        ));
    }

    #[test]
    fn trained_predictions_are_clipped() {
        let mut predictor = DemandCompetitionPredictor::new(ConfidencePolicy::Fixed(0.9));
        predictor.train(&dataset(), &quick_config()).expect("train");
        assert!(predictor.is_trained());
        assert!(predictor.performance().is_some());

        let out = predictor.predict("Pune", "Retail", "Retail shop 0", 750_000.0);
        assert_eq!(out.source, PredictionSource::Model);
        assert!((50.0..=100.0).contains(&out.demand));
        assert!((20.0..=80.0).contains(&out.competition));
        assert_eq!(out.quality, PredictionQuality::High);
        assert_eq!(out.confidence, 0.9);
    }

    #[test]
    fn quality_uses_unrounded_confidence() {
        let mut predictor = DemandCompetitionPredictor::new(ConfidencePolicy::Fixed(0.803));
        predictor.train(&dataset(), &quick_config()).expect("train");
        let out = predictor.predict("Agra", "Tech", "Tech shop 1", 500_000.0);
        assert_eq!(out.confidence, 0.8);
        assert_eq!(out.quality, PredictionQuality::High);
    }

    #[test]
    fn malformed_input_falls_back() {
        let mut predictor = DemandCompetitionPredictor::default();
        predictor.train(&dataset(), &quick_config()).expect("train");
        let out = predictor.predict("Pune", "Food", "Cafe", f64::NAN);
        assert_eq!(out.source, PredictionSource::Fallback);
        assert_eq!(out.confidence, 0.6);
    }

    #[test]
    fn importance_is_sorted_and_truncated() {
        let mut predictor = DemandCompetitionPredictor::default();
        predictor.train(&dataset(), &quick_config()).expect("train");
        let top = predictor.feature_importance(Target::Competition, 4);
        assert_eq!(top.len(), 4);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(top.iter().all(|(name, _)| FEATURE_NAMES.contains(name)));
    }

    #[test]
    fn training_rejects_tiny_datasets() {
        let tiny = Dataset::new(vec![BusinessRecord::new("Pune", "Food", "Cafe", 1.0, 60.0, 40.0)])
            .expect("dataset");
        let mut predictor = DemandCompetitionPredictor::default();
        assert!(matches!(
            predictor.train(&tiny, &quick_config()),
            Err(MlError::InsufficientData { rows: 1, .. })
        ));
        assert!(!predictor.is_trained());
    }
}
