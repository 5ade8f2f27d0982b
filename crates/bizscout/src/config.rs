use std::path::PathBuf;

use bizscout_ml::{ConfidencePolicy, ForestConfig, TrainConfig};

pub const DEFAULT_MODEL_DIR: &str = "models";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    pub use_ml: bool,
    pub model_dir: PathBuf,
    pub seed: u64,
    pub n_trees: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            use_ml: true,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            seed: 42,
            n_trees: 100,
        }
    }
}

impl AdvisorConfig {
    /// Reads `BIZSCOUT_USE_ML`, `BIZSCOUT_MODEL_DIR`, `BIZSCOUT_SEED` and
    /// `BIZSCOUT_FOREST_TREES`. Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let use_ml = match lookup("BIZSCOUT_USE_ML") {
            Some(v) => {
                let lowered = v.trim().to_ascii_lowercase();
                !(lowered == "0" || lowered == "false" || lowered == "off" || lowered == "no")
            }
            None => defaults.use_ml,
        };
        let model_dir = lookup("BIZSCOUT_MODEL_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map_or(defaults.model_dir, PathBuf::from);
        let seed = lookup("BIZSCOUT_SEED")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(defaults.seed);
        let n_trees = lookup("BIZSCOUT_FOREST_TREES")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(defaults.n_trees)
            .clamp(1, 1_000);
        Self {
            use_ml,
            model_dir,
            seed,
            n_trees,
        }
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            seed: self.seed,
            forest: ForestConfig {
                n_trees: self.n_trees,
                seed: self.seed,
                ..ForestConfig::default()
            },
            ..TrainConfig::default()
        }
    }

    pub fn confidence_policy(&self) -> ConfidencePolicy {
        match ConfidencePolicy::default() {
            ConfidencePolicy::Jitter { base, std_dev, .. } => ConfidencePolicy::Jitter {
                base,
                std_dev,
                seed: self.seed,
            },
            fixed @ ConfidencePolicy::Fixed(_) => fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(AdvisorConfig::from_lookup(|_| None), AdvisorConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = AdvisorConfig::from_lookup(lookup(&[
            ("BIZSCOUT_USE_ML", "off"),
            ("BIZSCOUT_MODEL_DIR", " /tmp/bizscout-models "),
            ("BIZSCOUT_SEED", "7"),
            ("BIZSCOUT_FOREST_TREES", "25"),
        ]));
        assert!(!cfg.use_ml);
        assert_eq!(cfg.model_dir, PathBuf::from("/tmp/bizscout-models"));
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.train_config().forest.n_trees, 25);
        assert_eq!(cfg.train_config().forest.seed, 7);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = AdvisorConfig::from_lookup(lookup(&[
            ("BIZSCOUT_USE_ML", "yes please"),
            ("BIZSCOUT_MODEL_DIR", "   "),
            ("BIZSCOUT_SEED", "-3"),
            ("BIZSCOUT_FOREST_TREES", "0"),
        ]));
        assert!(cfg.use_ml);
        assert_eq!(cfg.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.n_trees, 1);
    }

    #[test]
    fn confidence_policy_follows_seed() {
        let cfg = AdvisorConfig {
            seed: 11,
            ..AdvisorConfig::default()
        };
        assert!(matches!(
            cfg.confidence_policy(),
            ConfidencePolicy::Jitter { seed: 11, .. }
        ));
    }
}
