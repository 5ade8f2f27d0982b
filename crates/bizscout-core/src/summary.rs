use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::BusinessRecord;
use crate::scoring::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySummary {
    pub total_businesses: usize,
    pub categories: usize,
    pub avg_demand: f64,
    pub avg_competition: f64,
    pub min_investment: f64,
    pub max_investment: f64,
    pub avg_investment: f64,
    pub top_category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub avg_demand: f64,
    pub avg_competition: f64,
    pub avg_investment: f64,
    pub min_investment: f64,
    pub max_investment: f64,
    pub business_count: usize,
    /// Raw difference of the two means.
    pub market_gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityRow {
    pub city: String,
    pub average: f64,
    /// One raw market gap per column of the owning matrix.
    pub gaps: Vec<f64>,
}

/// City x category grid of raw market gaps, best cities first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityMatrix {
    pub categories: Vec<String>,
    pub rows: Vec<OpportunityRow>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Accumulator {
    count: usize,
    demand: f64,
    competition: f64,
    investment: f64,
    min_investment: f64,
    max_investment: f64,
}

impl Accumulator {
    pub(crate) fn push(&mut self, record: &BusinessRecord) {
        if self.count == 0 {
            self.min_investment = record.investment;
            self.max_investment = record.investment;
        } else {
            self.min_investment = self.min_investment.min(record.investment);
            self.max_investment = self.max_investment.max(record.investment);
        }
        self.count += 1;
        self.demand += record.demand;
        self.competition += record.competition;
        self.investment += record.investment;
    }

    pub(crate) const fn count(&self) -> usize {
        self.count
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn mean_demand(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.demand / self.count as f64
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn mean_competition(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.competition / self.count as f64
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn mean_investment(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.investment / self.count as f64
    }
}

pub(crate) fn city_summary<'a>(
    rows: impl Iterator<Item = &'a BusinessRecord>,
) -> Option<CitySummary> {
    let mut all = Accumulator::default();
    let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
    for record in rows {
        all.push(record);
        *per_category.entry(record.category.as_str()).or_default() += 1;
    }
    if all.count() == 0 {
        return None;
    }

    // BTreeMap iterates categories alphabetically; the first maximum wins.
    let mut top: Option<(&str, usize)> = None;
    for (category, count) in &per_category {
        match top {
            Some((_, best)) if *count <= best => {}
            _ => top = Some((*category, *count)),
        }
    }

    Some(CitySummary {
        total_businesses: all.count(),
        categories: per_category.len(),
        avg_demand: round_to(all.mean_demand(), 1),
        avg_competition: round_to(all.mean_competition(), 1),
        min_investment: all.min_investment,
        max_investment: all.max_investment,
        avg_investment: round_to(all.mean_investment(), 0),
        top_category: top.map(|(c, _)| c.to_string()).unwrap_or_default(),
    })
}

pub(crate) fn category_analysis<'a>(
    rows: impl Iterator<Item = &'a BusinessRecord>,
) -> BTreeMap<String, CategoryStats> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for record in rows {
        groups
            .entry(record.category.as_str())
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|(category, acc)| {
            let avg_demand = round_to(acc.mean_demand(), 2);
            let avg_competition = round_to(acc.mean_competition(), 2);
            let stats = CategoryStats {
                avg_demand,
                avg_competition,
                avg_investment: round_to(acc.mean_investment(), 2),
                min_investment: round_to(acc.min_investment, 2),
                max_investment: round_to(acc.max_investment, 2),
                business_count: acc.count(),
                market_gap: round_to(avg_demand - avg_competition, 2),
            };
            (category.to_string(), stats)
        })
        .collect()
}
