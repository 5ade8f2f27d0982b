use std::collections::BTreeSet;

use serde::Serialize;

use crate::record::BusinessRecord;

pub const MARKET_GAP_WEIGHT: f64 = 0.5;
pub const BUDGET_FIT_WEIGHT: f64 = 0.3;
pub const INTEREST_MATCH_WEIGHT: f64 = 0.2;

pub const TAG_HIGH_OPPORTUNITY: &str = "high opportunity";
pub const TAG_GOOD_POTENTIAL: &str = "good potential";
pub const TAG_COMPETITIVE_MARKET: &str = "competitive market";
pub const TAG_PERFECT_FIT: &str = "perfect fit";
pub const TAG_GOOD_ALIGNMENT: &str = "good alignment";
pub const TAG_MODERATE_REQUIREMENT: &str = "moderate requirement";
pub const TAG_HIGH_INVESTMENT: &str = "high investment needed";
pub const TAG_MATCHES_INTERESTS: &str = "matches interests";
pub const TAG_OUTSIDE_INTERESTS: &str = "outside preferred categories";

/// Demand minus competition, remapped from [-100, 100] onto [0, 100].
///
/// Not to be confused with the raw `demand - competition` gap reported by
/// model predictions.
pub fn market_gap(demand: f64, competition: f64) -> f64 {
    ((demand - competition) + 100.0) / 200.0 * 100.0
}

pub fn budget_fit(budget: f64, required_investment: f64) -> f64 {
    if budget >= required_investment {
        return 100.0;
    }
    (budget / required_investment * 100.0).clamp(0.0, 100.0)
}

pub fn interest_match(interests: &BTreeSet<String>, category: &str) -> f64 {
    if interests.contains(category) {
        100.0
    } else {
        0.0
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

/// The three sub-scores of one record under one query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub market_gap: f64,
    pub budget_fit: f64,
    pub interest_match: f64,
}

impl ScoreBreakdown {
    pub fn compute(record: &BusinessRecord, budget: f64, interests: &BTreeSet<String>) -> Self {
        Self {
            market_gap: market_gap(record.demand, record.competition),
            budget_fit: budget_fit(budget, record.investment),
            interest_match: interest_match(interests, &record.category),
        }
    }

    pub fn total(&self) -> f64 {
        let total = MARKET_GAP_WEIGHT * self.market_gap
            + BUDGET_FIT_WEIGHT * self.budget_fit
            + INTEREST_MATCH_WEIGHT * self.interest_match;
        round_to(total, 2)
    }

    /// Market, budget and interest tags, in that order.
    pub fn tags(&self) -> Vec<&'static str> {
        let market = if self.market_gap >= 70.0 {
            TAG_HIGH_OPPORTUNITY
        } else if self.market_gap >= 50.0 {
            TAG_GOOD_POTENTIAL
        } else {
            TAG_COMPETITIVE_MARKET
        };

        #[allow(clippy::float_cmp)]
        let budget = if self.budget_fit == 100.0 {
            TAG_PERFECT_FIT
        } else if self.budget_fit >= 80.0 {
            TAG_GOOD_ALIGNMENT
        } else if self.budget_fit >= 50.0 {
            TAG_MODERATE_REQUIREMENT
        } else {
            TAG_HIGH_INVESTMENT
        };

        #[allow(clippy::float_cmp)]
        let interest = if self.interest_match == 100.0 {
            TAG_MATCHES_INTERESTS
        } else {
            TAG_OUTSIDE_INTERESTS
        };

        vec![market, budget, interest]
    }
}

pub fn total_score(record: &BusinessRecord, budget: f64, interests: &BTreeSet<String>) -> f64 {
    ScoreBreakdown::compute(record, budget, interests).total()
}

pub fn explain(
    record: &BusinessRecord,
    budget: f64,
    interests: &BTreeSet<String>,
) -> Vec<&'static str> {
    ScoreBreakdown::compute(record, budget, interests).tags()
}

/// A record scored against one query. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub record: BusinessRecord,
    pub market_gap: f64,
    pub budget_fit: f64,
    pub interest_match: f64,
    pub total_score: f64,
    pub explanation: Vec<&'static str>,
}

impl ScoredCandidate {
    pub fn score(record: &BusinessRecord, budget: f64, interests: &BTreeSet<String>) -> Self {
        let breakdown = ScoreBreakdown::compute(record, budget, interests);
        Self {
            record: record.clone(),
            market_gap: breakdown.market_gap,
            budget_fit: breakdown.budget_fit,
            interest_match: breakdown.interest_match,
            total_score: breakdown.total(),
            explanation: breakdown.tags(),
        }
    }

    pub fn explanation_line(&self) -> String {
        self.explanation.join(" | ")
    }
}
