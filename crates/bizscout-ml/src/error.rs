use bizscout_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("models are not trained")]
    NotTrained,

    #[error("not enough rows to train: have {rows}, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("feature vector has {got} values, expected {expected}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("corrupt model: {0}")]
    CorruptModel(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
