pub mod confidence;
pub mod encoder;
pub mod error;
pub mod fallback;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod model;
pub mod predictor;
pub mod scaler;
pub mod tree;

pub use confidence::{ConfidenceEstimator, ConfidencePolicy};
pub use encoder::{Encoders, LabelEncoder, UNKNOWN_CODE};
pub use error::MlError;
pub use fallback::{fallback_prediction, FALLBACK_CONFIDENCE};
pub use features::{
    FeatureAggregates, FeatureSpace, FeatureVector, GroupStats, FEATURE_COUNT, FEATURE_NAMES,
};
pub use forest::{ForestConfig, RandomForest};
pub use metrics::{ModelPerformance, TargetMetrics};
pub use model::{Target, TrainConfig, TrainedModelPair};
pub use predictor::{DemandCompetitionPredictor, COMPETITION_BOUNDS, DEMAND_BOUNDS};
pub use scaler::StandardScaler;
pub use tree::{Node, RegressionTree, TreeConfig};
