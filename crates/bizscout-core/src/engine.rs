use std::collections::{BTreeMap, BTreeSet};

use crate::prediction::{PredictionQuality, PredictionResult, PredictionSource};
use crate::record::{BusinessRecord, Dataset, DatasetError};
use crate::scoring::{round_to, ScoredCandidate};
use crate::summary::{
    self, Accumulator, CategoryStats, CitySummary, OpportunityMatrix, OpportunityRow,
};

const BASIC_DEFAULT_DEMAND: f64 = 70.0;
const BASIC_DEFAULT_COMPETITION: f64 = 50.0;
const BASIC_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct UserQuery {
    pub city: String,
    pub budget: f64,
    pub interests: BTreeSet<String>,
    pub count: usize,
}

impl UserQuery {
    pub fn new(city: impl Into<String>, budget: f64) -> Self {
        Self {
            city: city.into(),
            budget,
            interests: BTreeSet::new(),
            count: 3,
        }
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Deterministic scoring and ranking over a read-only dataset.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    dataset: Dataset,
}

impl ScoringEngine {
    pub fn new(dataset: Dataset) -> Self {
        log::info!("dataset loaded: {} businesses", dataset.len());
        Self { dataset }
    }

    pub fn from_records(records: Vec<BusinessRecord>) -> Result<Self, DatasetError> {
        Ok(Self::new(Dataset::new(records)?))
    }

    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn available_cities(&self) -> Vec<String> {
        self.dataset
            .cities()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn available_categories(&self) -> Vec<String> {
        self.dataset
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Smallest and largest investment in the dataset.
    pub fn investment_range(&self) -> (f64, f64) {
        self.dataset
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
                (lo.min(r.investment), hi.max(r.investment))
            })
    }

    pub fn recommend(&self, query: &UserQuery) -> Vec<ScoredCandidate> {
        let mut candidates: Vec<ScoredCandidate> = self
            .dataset
            .in_city(&query.city)
            .map(|record| ScoredCandidate::score(record, query.budget, &query.interests))
            .collect();
        if candidates.is_empty() {
            log::debug!("no businesses recorded for city {:?}", query.city);
            return candidates;
        }

        // Stable: equal scores keep dataset order.
        candidates.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        candidates.truncate(query.count);
        candidates
    }

    pub fn city_summary(&self, city: &str) -> Option<CitySummary> {
        summary::city_summary(self.dataset.in_city(city))
    }

    pub fn category_analysis(&self, city: &str) -> BTreeMap<String, CategoryStats> {
        summary::category_analysis(self.dataset.in_city(city))
    }

    /// Dataset-average estimate used when no trained model is available.
    pub fn basic_prediction(&self, city: &str, category: &str) -> PredictionResult {
        let mut local = Accumulator::default();
        let mut national = Accumulator::default();
        for record in self.dataset.iter().filter(|r| r.category == category) {
            national.push(record);
            if record.city == city {
                local.push(record);
            }
        }

        let (demand, competition) = if local.count() > 0 {
            (local.mean_demand(), local.mean_competition())
        } else if national.count() > 0 {
            (national.mean_demand(), national.mean_competition())
        } else {
            (BASIC_DEFAULT_DEMAND, BASIC_DEFAULT_COMPETITION)
        };

        PredictionResult {
            demand: round_to(demand, 1),
            competition: round_to(competition, 1),
            market_gap: round_to(demand - competition, 1),
            confidence: BASIC_CONFIDENCE,
            quality: PredictionQuality::Basic,
            source: PredictionSource::DatasetAverage,
        }
    }

    /// Raw market gap per (city, category); an empty `categories` slice
    /// means every category in the dataset.
    #[allow(clippy::cast_precision_loss)]
    pub fn opportunity_matrix(&self, categories: &[String], top_cities: usize) -> OpportunityMatrix {
        let categories = if categories.is_empty() {
            self.available_categories()
        } else {
            categories.to_vec()
        };

        let mut cells: BTreeMap<(&str, &str), Accumulator> = BTreeMap::new();
        for record in self.dataset.iter() {
            cells
                .entry((record.city.as_str(), record.category.as_str()))
                .or_default()
                .push(record);
        }

        let mut rows: Vec<OpportunityRow> = self
            .dataset
            .cities()
            .into_iter()
            .map(|city| {
                let gaps: Vec<f64> = categories
                    .iter()
                    .map(|category| {
                        cells
                            .get(&(city, category.as_str()))
                            .map_or(0.0, |acc| acc.mean_demand() - acc.mean_competition())
                    })
                    .collect();
                let average = if gaps.is_empty() {
                    0.0
                } else {
                    gaps.iter().sum::<f64>() / gaps.len() as f64
                };
                OpportunityRow {
                    city: city.to_string(),
                    average,
                    gaps,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.average.total_cmp(&a.average));
        rows.truncate(top_cities);
        OpportunityMatrix { categories, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::from_records(vec![
            BusinessRecord::new("Pune", "Food", "Cafe", 1_000_000.0, 80.0, 40.0),
            BusinessRecord::new("Pune", "Tech", "Studio", 4_000_000.0, 70.0, 50.0),
            BusinessRecord::new("Pune", "Retail", "Kiosk", 500_000.0, 60.0, 70.0),
            BusinessRecord::new("Surat", "Food", "Bakery", 800_000.0, 65.0, 55.0),
        ])
        .expect("engine")
    }

    #[test]
    fn lists_distinct_sorted_values() {
        let engine = engine();
        assert_eq!(engine.available_cities(), vec!["Pune", "Surat"]);
        assert_eq!(engine.available_categories(), vec!["Food", "Retail", "Tech"]);
        assert_eq!(engine.investment_range(), (500_000.0, 4_000_000.0));
    }

    #[test]
    fn recommend_ranks_within_city() {
        let query = UserQuery::new("Pune", 2_000_000.0)
            .with_interests(["Tech"])
            .with_count(2);
        let out = engine().recommend(&query);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].record.business_name, "Cafe");
        assert!(out[0].total_score >= out[1].total_score);
        assert!(out.iter().all(|c| c.record.city == "Pune"));
    }

    #[test]
    fn unknown_city_yields_empty() {
        let out = engine().recommend(&UserQuery::new("Atlantis", 1.0));
        assert!(out.is_empty());
        assert!(engine().city_summary("Atlantis").is_none());
        assert!(engine().category_analysis("Atlantis").is_empty());
    }

    #[test]
    fn basic_prediction_widens_scope_then_defaults() {
        let engine = engine();
        let local = engine.basic_prediction("Pune", "Food");
        assert_eq!((local.demand, local.competition), (80.0, 40.0));
        assert_eq!(local.quality, PredictionQuality::Basic);

        let national = engine.basic_prediction("Delhi", "Food");
        assert_eq!(national.demand, 72.5);
        assert_eq!(national.competition, 47.5);
        assert_eq!(national.market_gap, 25.0);

        let unknown = engine.basic_prediction("Delhi", "Aerospace");
        assert_eq!((unknown.demand, unknown.competition), (70.0, 50.0));
        assert_eq!(unknown.confidence, 0.7);
    }

    #[test]
    fn opportunity_matrix_orders_cities_by_average_gap() {
        let matrix = engine().opportunity_matrix(&["Food".to_string()], 5);
        assert_eq!(matrix.categories, vec!["Food"]);
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[0].city, "Pune");
        assert_eq!(matrix.rows[0].gaps, vec![40.0]);
        assert_eq!(matrix.rows[1].average, 10.0);

        let all = engine().opportunity_matrix(&[], 1);
        assert_eq!(all.categories.len(), 3);
        assert_eq!(all.rows.len(), 1);
        // Surat has no Retail/Tech rows; those cells count as zero.
        assert_eq!(all.rows[0].city, "Pune");
    }
}
