pub mod engine;
pub mod prediction;
pub mod record;
pub mod scoring;
pub mod summary;

pub use engine::*;
pub use prediction::*;
pub use record::*;
pub use scoring::*;
pub use summary::{CategoryStats, CitySummary, OpportunityMatrix, OpportunityRow};
