use async_trait::async_trait;

use crate::domain::cycle::CycleSummary;
use crate::domain::product::{PriceChange, Product};
use crate::errors::CatalogError;

/// One full scan of the catalog. Rows the store could not decode are handed
/// back as errors so the cycle can log and skip them individually.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub rejected: Vec<CatalogError>,
}

impl CatalogSnapshot {
    pub fn scanned(&self) -> usize {
        self.products.len() + self.rejected.len()
    }
}

/// The product catalog as the pricing engine needs it: a full read and a bulk
/// `current_price` write.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load_catalog(&self) -> Result<CatalogSnapshot, CatalogError>;

    /// Applies every change in one bulk operation and returns how many
    /// products were updated.
    async fn apply_price_updates(&self, changes: &[PriceChange]) -> Result<u64, CatalogError>;
}

/// Optional sink for finished cycle summaries.
#[async_trait]
pub trait CycleRecorder: Send + Sync {
    async fn record(&self, summary: &CycleSummary) -> Result<(), CatalogError>;
}
