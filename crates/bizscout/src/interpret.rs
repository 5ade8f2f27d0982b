//! Human-readable verdicts attached to model-backed predictions.

pub const EXCELLENT_OPPORTUNITY: &str = "excellent opportunity";
pub const GOOD_OPPORTUNITY: &str = "good opportunity";
pub const MODERATE_OPPORTUNITY: &str = "moderate opportunity";
pub const CHALLENGING_MARKET: &str = "challenging market";

pub const HIGHLY_RECOMMENDED: &str = "highly recommended";
pub const RECOMMENDED: &str = "recommended";
pub const NEEDS_MORE_RESEARCH: &str = "needs more research";
pub const PROCEED_WITH_CAUTION: &str = "proceed with caution";

/// `market_gap` is the raw `demand - competition` difference.
pub fn interpretation(market_gap: f64, confidence: f64) -> &'static str {
    if market_gap > 20.0 && confidence > 0.8 {
        EXCELLENT_OPPORTUNITY
    } else if market_gap > 15.0 && confidence > 0.7 {
        GOOD_OPPORTUNITY
    } else if market_gap > 5.0 {
        MODERATE_OPPORTUNITY
    } else {
        CHALLENGING_MARKET
    }
}

pub fn recommendation(demand: f64, competition: f64, confidence: f64) -> &'static str {
    if demand > 80.0 && competition < 40.0 {
        HIGHLY_RECOMMENDED
    } else if demand > 70.0 && competition < 60.0 {
        RECOMMENDED
    } else if confidence < 0.6 {
        NEEDS_MORE_RESEARCH
    } else {
        PROCEED_WITH_CAUTION
    }
}
