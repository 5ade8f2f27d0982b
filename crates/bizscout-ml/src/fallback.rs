use bizscout_core::{PredictionQuality, PredictionResult, PredictionSource};

pub const FALLBACK_CONFIDENCE: f64 = 0.6;

const DEFAULT_ESTIMATE: (f64, f64) = (70.0, 60.0);

const CATEGORY_ESTIMATES: [(&str, f64, f64); 7] = [
    ("Food", 75.0, 65.0),
    ("Tech", 80.0, 55.0),
    ("Healthcare", 85.0, 45.0),
    ("Education", 70.0, 60.0),
    ("Fitness", 72.0, 50.0),
    ("Tourism", 68.0, 55.0),
    ("Retail", 65.0, 70.0),
];

/// Static per-category estimate used whenever the models cannot answer.
pub fn fallback_prediction(category: &str) -> PredictionResult {
    let (demand, competition) = CATEGORY_ESTIMATES
        .iter()
        .find(|(name, _, _)| *name == category)
        .map_or(DEFAULT_ESTIMATE, |(_, d, c)| (*d, *c));

    PredictionResult {
        demand,
        competition,
        market_gap: demand - competition,
        confidence: FALLBACK_CONFIDENCE,
        quality: PredictionQuality::Medium,
        source: PredictionSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_have_entries() {
        let p = fallback_prediction("Healthcare");
        assert_eq!((p.demand, p.competition, p.market_gap), (85.0, 45.0, 40.0));
        assert_eq!(p.quality, PredictionQuality::Medium);
        assert_eq!(p.confidence, 0.6);
    }

    #[test]
    fn unknown_category_uses_default() {
        let p = fallback_prediction("Space Mining");
        assert_eq!((p.demand, p.competition), (70.0, 60.0));
        assert_eq!(p.source, PredictionSource::Fallback);
    }
}
