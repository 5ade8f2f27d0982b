use bizscout_core::round_to;
use serde::{Deserialize, Serialize};

#[allow(clippy::cast_precision_loss)]
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    total / n as f64
}

/// Coefficient of determination. A constant target scores 1 when predicted
/// exactly and 0 otherwise.
#[allow(clippy::cast_precision_loss)]
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let mean = actual.iter().take(n).sum::<f64>() / n as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().take(n).map(|a| (a - mean).powi(2)).sum();
    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetMetrics {
    pub mae: f64,
    pub r2: f64,
    /// `(1 - mae / 100) * 100`, targets being on a 0-100 scale.
    pub accuracy: f64,
}

impl TargetMetrics {
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Self {
        let mae = mean_absolute_error(actual, predicted);
        Self {
            mae: round_to(mae, 2),
            r2: round_to(r2_score(actual, predicted), 3),
            accuracy: round_to((1.0 - mae / 100.0) * 100.0, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub demand: TargetMetrics,
    pub competition: TargetMetrics,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let y = [10.0, 20.0, 30.0];
        let m = TargetMetrics::evaluate(&y, &y);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.accuracy, 100.0);
    }

    #[test]
    fn mean_predictor_has_zero_r2() {
        let y = [10.0, 20.0, 30.0];
        let p = [20.0, 20.0, 20.0];
        assert_eq!(r2_score(&y, &p), 0.0);
        let m = TargetMetrics::evaluate(&y, &p);
        assert_eq!(m.mae, 6.67);
        assert_eq!(m.accuracy, 93.3);
    }

    #[test]
    fn constant_target_edge_case() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }
}
