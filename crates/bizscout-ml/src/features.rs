use std::collections::BTreeMap;

use bizscout_core::{BusinessRecord, Dataset};
use serde::{Deserialize, Serialize};

use crate::encoder::{Encoders, LabelEncoder};
use crate::error::MlError;

pub const FEATURE_COUNT: usize = 14;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "city_encoded",
    "category_encoded",
    "business_encoded",
    "investment_log",
    "investment_millions",
    "city_avg_investment",
    "city_investment_std",
    "city_business_count",
    "city_avg_demand",
    "city_avg_competition",
    "category_avg_investment",
    "category_investment_std",
    "category_avg_demand",
    "category_avg_competition",
];

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Training-time statistics of one city or one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub avg_investment: f64,
    /// Sample standard deviation; zero for single-row groups.
    pub investment_std: f64,
    pub count: usize,
    pub avg_demand: f64,
    pub avg_competition: f64,
}

impl GroupStats {
    #[allow(clippy::cast_precision_loss)]
    fn from_rows(rows: &[&BusinessRecord]) -> Self {
        let n = rows.len();
        if n == 0 {
            return Self::default();
        }
        let nf = n as f64;
        let avg_investment = rows.iter().map(|r| r.investment).sum::<f64>() / nf;
        let investment_std = if n > 1 {
            let ss = rows
                .iter()
                .map(|r| (r.investment - avg_investment).powi(2))
                .sum::<f64>();
            (ss / (nf - 1.0)).sqrt()
        } else {
            0.0
        };
        Self {
            avg_investment,
            investment_std,
            count: n,
            avg_demand: rows.iter().map(|r| r.demand).sum::<f64>() / nf,
            avg_competition: rows.iter().map(|r| r.competition).sum::<f64>() / nf,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureAggregates {
    pub city: BTreeMap<String, GroupStats>,
    pub category: BTreeMap<String, GroupStats>,
}

impl FeatureAggregates {
    fn fit(dataset: &Dataset) -> Self {
        let mut by_city: BTreeMap<&str, Vec<&BusinessRecord>> = BTreeMap::new();
        let mut by_category: BTreeMap<&str, Vec<&BusinessRecord>> = BTreeMap::new();
        for record in dataset.iter() {
            by_city.entry(record.city.as_str()).or_default().push(record);
            by_category
                .entry(record.category.as_str())
                .or_default()
                .push(record);
        }
        Self {
            city: by_city
                .into_iter()
                .map(|(k, rows)| (k.to_string(), GroupStats::from_rows(&rows)))
                .collect(),
            category: by_category
                .into_iter()
                .map(|(k, rows)| (k.to_string(), GroupStats::from_rows(&rows)))
                .collect(),
        }
    }
}

/// Everything needed to turn a raw row into a [`FeatureVector`]: the frozen
/// encoders plus the aggregate tables joined in from the training data.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpace {
    pub encoders: Encoders,
    pub aggregates: FeatureAggregates,
}

impl FeatureSpace {
    pub fn fit(dataset: &Dataset) -> Self {
        let encoders = Encoders {
            city: LabelEncoder::fit(dataset.iter().map(|r| r.city.as_str())),
            category: LabelEncoder::fit(dataset.iter().map(|r| r.category.as_str())),
            business: LabelEncoder::fit(dataset.iter().map(|r| r.business_name.as_str())),
        };
        Self {
            encoders,
            aggregates: FeatureAggregates::fit(dataset),
        }
    }

    /// Unknown cities, categories and names get the sentinel code and
    /// all-zero aggregates; only a non-finite or negative investment fails.
    #[allow(clippy::cast_precision_loss)]
    pub fn vector(
        &self,
        city: &str,
        category: &str,
        business: &str,
        investment: f64,
    ) -> Result<FeatureVector, MlError> {
        if !investment.is_finite() || investment < 0.0 {
            return Err(MlError::InvalidInput(format!(
                "investment must be a non-negative number, got {investment}"
            )));
        }

        let city_stats = self.aggregates.city.get(city).copied().unwrap_or_default();
        let category_stats = self
            .aggregates
            .category
            .get(category)
            .copied()
            .unwrap_or_default();

        Ok([
            self.encoders.city.encode(city) as f64,
            self.encoders.category.encode(category) as f64,
            self.encoders.business.encode(business) as f64,
            investment.ln_1p(),
            investment / 1_000_000.0,
            city_stats.avg_investment,
            city_stats.investment_std,
            city_stats.count as f64,
            city_stats.avg_demand,
            city_stats.avg_competition,
            category_stats.avg_investment,
            category_stats.investment_std,
            category_stats.avg_demand,
            category_stats.avg_competition,
        ])
    }

    pub fn record_vector(&self, record: &BusinessRecord) -> Result<FeatureVector, MlError> {
        self.vector(
            &record.city,
            &record.category,
            &record.business_name,
            record.investment,
        )
    }
}
