use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionQuality {
    High,
    Medium,
    Low,
    /// Dataset averages only, no model involved.
    Basic,
}

impl PredictionQuality {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            Self::High
        } else if confidence > 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Basic => "Basic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionSource {
    Model,
    Fallback,
    DatasetAverage,
}

/// Demand/competition estimate for a business that may not be in the dataset.
///
/// `market_gap` here is the raw `demand - competition` difference and is not
/// renormalized onto [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub demand: f64,
    pub competition: f64,
    pub market_gap: f64,
    pub confidence: f64,
    pub quality: PredictionQuality,
    pub source: PredictionSource,
}
