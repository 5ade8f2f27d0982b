use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of the historical business dataset.
///
/// Field names on the wire follow the dataset columns
/// (`City`, `Category`, `Business`, `Investment`, `Demand`, `Competition`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessRecord {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Business")]
    pub business_name: String,
    #[serde(rename = "Investment")]
    pub investment: f64,
    #[serde(rename = "Demand")]
    pub demand: f64,
    #[serde(rename = "Competition")]
    pub competition: f64,
}

impl BusinessRecord {
    pub fn new(
        city: impl Into<String>,
        category: impl Into<String>,
        business_name: impl Into<String>,
        investment: f64,
        demand: f64,
        competition: f64,
    ) -> Self {
        Self {
            city: city.into(),
            category: category.into(),
            business_name: business_name.into(),
            investment,
            demand,
            competition,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.city.trim().is_empty() {
            return Err("city is empty");
        }
        if self.category.trim().is_empty() {
            return Err("category is empty");
        }
        if self.business_name.trim().is_empty() {
            return Err("business name is empty");
        }
        if !self.investment.is_finite() || self.investment <= 0.0 {
            return Err("investment must be a positive number");
        }
        if !(0.0..=100.0).contains(&self.demand) {
            return Err("demand must lie in [0, 100]");
        }
        if !(0.0..=100.0).contains(&self.competition) {
            return Err("competition must lie in [0, 100]");
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("dataset contains no rows")]
    Empty,
    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: &'static str },
}

/// Validated, read-only collection of business records.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<BusinessRecord>,
}

impl Dataset {
    pub fn new(records: Vec<BusinessRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        for (row, record) in records.iter().enumerate() {
            record
                .validate()
                .map_err(|reason| DatasetError::MalformedRow { row, reason })?;
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusinessRecord> {
        self.records.iter()
    }

    pub fn in_city<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a BusinessRecord> + 'a {
        self.records.iter().filter(move |r| r.city == city)
    }

    pub fn cities(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.city.as_str()).collect()
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.category.as_str()).collect()
    }
}
