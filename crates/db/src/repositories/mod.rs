use async_trait::async_trait;
use thiserror::Error;

use dynaprice_core::domain::cycle::CycleSummary;
use dynaprice_core::engine::CycleRecorder;

pub mod catalog;
pub mod cycle_history;
pub mod memory;

pub use catalog::SqlCatalogStore;
pub use cycle_history::SqlCycleHistory;
pub use memory::{InMemoryCatalogStore, InMemoryCycleHistory};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read side of the `pricing_cycle` history.
#[async_trait]
pub trait CycleHistoryRepository: CycleRecorder {
    /// Most recent cycles first.
    async fn recent(&self, limit: u32) -> Result<Vec<CycleSummary>, RepositoryError>;
}
