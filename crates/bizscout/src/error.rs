use bizscout_core::DatasetError;
use bizscout_storage::StorageError;
use thiserror::Error;

/// Failures that prevent an [`Advisor`](crate::Advisor) from being built.
/// Model problems never show up here; they disable ML instead.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
