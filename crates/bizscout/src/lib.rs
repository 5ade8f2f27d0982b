pub mod advisor;
pub mod config;
pub mod error;
pub mod interpret;

pub use advisor::{Advisor, MlStatus, OpportunityAssessment};
pub use config::AdvisorConfig;
pub use error::AdvisorError;

pub use bizscout_core::{
    BusinessRecord, CategoryStats, CitySummary, Dataset, DatasetError, OpportunityMatrix,
    OpportunityRow, PredictionQuality, PredictionResult, PredictionSource, ScoredCandidate,
    ScoringEngine, UserQuery,
};
pub use bizscout_ml::{ConfidencePolicy, DemandCompetitionPredictor, ModelPerformance, Target};
pub use bizscout_storage::{BlobStore, FileBlobStore, MemoryBlobStore, StorageError};
