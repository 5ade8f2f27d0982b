use std::collections::BTreeMap;
use std::path::Path;

use bizscout_core::{
    BusinessRecord, CategoryStats, CitySummary, OpportunityMatrix, PredictionResult,
    ScoredCandidate, ScoringEngine, UserQuery,
};
use bizscout_ml::{DemandCompetitionPredictor, ModelPerformance, Target};
use bizscout_storage::{load_dataset, BlobStore, FileBlobStore};
use serde::Serialize;

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::interpret::{interpretation, recommendation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MlStatus {
    Enabled,
    Disabled { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityAssessment {
    pub prediction: PredictionResult,
    /// Set only when the prediction came from the ML path.
    pub interpretation: Option<&'static str>,
    pub recommendation: Option<&'static str>,
}

/// Entry point for callers: the scoring engine plus, when available, a
/// trained demand/competition predictor.
///
/// Build one at startup and share it by reference. Every query method takes
/// `&self`.
#[derive(Debug)]
pub struct Advisor {
    engine: ScoringEngine,
    predictor: Option<DemandCompetitionPredictor>,
    status: MlStatus,
}

impl Advisor {
    pub fn without_ml(engine: ScoringEngine) -> Self {
        Self {
            engine,
            predictor: None,
            status: MlStatus::Disabled {
                reason: "disabled by configuration".to_string(),
            },
        }
    }

    /// Loads the dataset file and opens the model directory named by
    /// `config`, then runs [`bootstrap`](Self::bootstrap).
    pub fn open(dataset_path: impl AsRef<Path>, config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let engine = ScoringEngine::new(load_dataset(dataset_path)?);
        if !config.use_ml {
            return Ok(Self::without_ml(engine));
        }
        let mut store = FileBlobStore::open(&config.model_dir)?;
        Ok(Self::bootstrap(engine, config, &mut store))
    }

    pub fn from_records<S: BlobStore + ?Sized>(
        records: Vec<BusinessRecord>,
        config: &AdvisorConfig,
        store: &mut S,
    ) -> Result<Self, AdvisorError> {
        let engine = ScoringEngine::from_records(records)?;
        Ok(Self::bootstrap(engine, config, store))
    }

    /// Restores models from `store`, or trains and persists them on a miss.
    /// A failed training run leaves the advisor usable with ML disabled.
    pub fn bootstrap<S: BlobStore + ?Sized>(
        engine: ScoringEngine,
        config: &AdvisorConfig,
        store: &mut S,
    ) -> Self {
        if !config.use_ml {
            return Self::without_ml(engine);
        }

        let mut predictor = DemandCompetitionPredictor::new(config.confidence_policy());
        match predictor.restore(store) {
            Ok(true) => return Self::with_predictor(engine, predictor),
            Ok(false) => {}
            Err(err) => log::warn!("saved models unusable, retraining: {err}"),
        }

        if let Err(err) = predictor.train(engine.dataset(), &config.train_config()) {
            let reason = format!("training failed: {err}");
            log::warn!("ML disabled: {reason}");
            return Self {
                engine,
                predictor: None,
                status: MlStatus::Disabled { reason },
            };
        }
        if let Err(err) = predictor.persist(store) {
            log::warn!("could not persist trained models: {err}");
        }
        Self::with_predictor(engine, predictor)
    }

    const fn with_predictor(engine: ScoringEngine, predictor: DemandCompetitionPredictor) -> Self {
        Self {
            engine,
            predictor: Some(predictor),
            status: MlStatus::Enabled,
        }
    }

    pub const fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub const fn predictor(&self) -> Option<&DemandCompetitionPredictor> {
        self.predictor.as_ref()
    }

    pub const fn ml_status(&self) -> &MlStatus {
        &self.status
    }

    pub const fn is_ml_enabled(&self) -> bool {
        matches!(self.status, MlStatus::Enabled)
    }

    pub fn available_cities(&self) -> Vec<String> {
        self.engine.available_cities()
    }

    pub fn available_categories(&self) -> Vec<String> {
        self.engine.available_categories()
    }

    pub fn investment_range(&self) -> (f64, f64) {
        self.engine.investment_range()
    }

    pub fn recommend(&self, query: &UserQuery) -> Vec<ScoredCandidate> {
        self.engine.recommend(query)
    }

    pub fn city_summary(&self, city: &str) -> Option<CitySummary> {
        self.engine.city_summary(city)
    }

    pub fn category_analysis(&self, city: &str) -> BTreeMap<String, CategoryStats> {
        self.engine.category_analysis(city)
    }

    pub fn opportunity_matrix(&self, categories: &[String], top_cities: usize) -> OpportunityMatrix {
        self.engine.opportunity_matrix(categories, top_cities)
    }

    pub fn model_performance(&self) -> Option<&ModelPerformance> {
        self.predictor.as_ref().and_then(DemandCompetitionPredictor::performance)
    }

    pub fn feature_importance(&self, target: Target, top_n: usize) -> Vec<(&'static str, f64)> {
        self.predictor
            .as_ref()
            .map(|p| p.feature_importance(target, top_n))
            .unwrap_or_default()
    }

    /// Never fails. With ML disabled the answer is the dataset-average
    /// estimate and carries no interpretation.
    pub fn predict_new_business_opportunity(
        &self,
        city: &str,
        category: &str,
        business_name: &str,
        investment: f64,
    ) -> OpportunityAssessment {
        let Some(predictor) = &self.predictor else {
            return OpportunityAssessment {
                prediction: self.engine.basic_prediction(city, category),
                interpretation: None,
                recommendation: None,
            };
        };

        let prediction = predictor.predict(city, category, business_name, investment);
        OpportunityAssessment {
            interpretation: Some(interpretation(prediction.market_gap, prediction.confidence)),
            recommendation: Some(recommendation(
                prediction.demand,
                prediction.competition,
                prediction.confidence,
            )),
            prediction,
        }
    }
}
