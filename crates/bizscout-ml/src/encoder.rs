use serde::{Deserialize, Serialize};

/// Code assigned to values never seen while fitting.
pub const UNKNOWN_CODE: i64 = -1;

/// Frozen bijection between observed strings and dense codes `0..n`.
///
/// Classes are kept sorted, so the code of a value is its rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = values.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn encode(&self, value: &str) -> i64 {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .map_or(UNKNOWN_CODE, |idx| idx as i64)
    }

    pub fn decode(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Encoders for the three categorical dataset columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoders {
    pub city: LabelEncoder,
    pub category: LabelEncoder,
    pub business: LabelEncoder,
}
