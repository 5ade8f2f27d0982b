use parking_lot::Mutex;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;

/// How a prediction's confidence is produced. This is a bounded heuristic,
/// not a statistical interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConfidencePolicy {
    /// `base + N(0, std_dev)`, clamped to [0, 1].
    Jitter { base: f64, std_dev: f64, seed: u64 },
    Fixed(f64),
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self::Jitter {
            base: 0.85,
            std_dev: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug)]
pub struct ConfidenceEstimator {
    policy: ConfidencePolicy,
    /// `None` for `Fixed` and for a jitter whose parameters `Normal` rejects
    /// (zero or NaN spread); those always yield the base value.
    normal: Option<Normal>,
    rng: Mutex<StdRng>,
}

impl ConfidenceEstimator {
    pub fn new(policy: ConfidencePolicy) -> Self {
        let (seed, normal) = match policy {
            ConfidencePolicy::Jitter {
                base,
                std_dev,
                seed,
            } => (seed, Normal::new(base, std_dev).ok()),
            ConfidencePolicy::Fixed(_) => (0, None),
        };
        Self {
            policy,
            normal,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub const fn policy(&self) -> ConfidencePolicy {
        self.policy
    }

    pub fn next(&self) -> f64 {
        let raw = match (self.policy, &self.normal) {
            (_, Some(normal)) => normal.sample(&mut *self.rng.lock()),
            (ConfidencePolicy::Fixed(value), None) => value,
            (ConfidencePolicy::Jitter { base, .. }, None) => base,
        };
        if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for ConfidenceEstimator {
    fn default() -> Self {
        Self::new(ConfidencePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_bounded_and_mostly_high() {
        let est = ConfidenceEstimator::default();
        let samples: Vec<f64> = (0..2_000).map(|_| est.next()).collect();
        assert!(samples.iter().all(|c| (0.0..=1.0).contains(c)));
        let high = samples.iter().filter(|c| **c > 0.8).count();
        assert!(high > 1_000, "high = {high}");
        assert!(samples.iter().any(|c| *c < 0.8));
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = ConfidenceEstimator::new(ConfidencePolicy::Jitter {
            base: 0.85,
            std_dev: 0.1,
            seed: 9,
        });
        let b = ConfidenceEstimator::new(a.policy());
        for _ in 0..10 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn zero_spread_jitter_returns_base() {
        let est = ConfidenceEstimator::new(ConfidencePolicy::Jitter {
            base: 0.7,
            std_dev: 0.0,
            seed: 1,
        });
        assert_eq!(est.next(), 0.7);
        assert_eq!(est.next(), 0.7);
    }

    #[test]
    fn fixed_policy_is_clamped() {
        assert_eq!(ConfidenceEstimator::new(ConfidencePolicy::Fixed(0.9)).next(), 0.9);
        assert_eq!(ConfidenceEstimator::new(ConfidencePolicy::Fixed(1.7)).next(), 1.0);
    }
}
