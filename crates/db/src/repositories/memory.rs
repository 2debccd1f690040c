use std::collections::HashMap;

use tokio::sync::RwLock;

use dynaprice_core::domain::cycle::CycleSummary;
use dynaprice_core::domain::product::{PriceChange, Product, ProductId};
use dynaprice_core::engine::{CatalogSnapshot, CatalogStore, CycleRecorder};
use dynaprice_core::errors::CatalogError;

use super::{CycleHistoryRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryCatalogStore {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products =
            products.into_iter().map(|product| (product.id.0.clone(), product)).collect();
        Self { products: RwLock::new(products) }
    }

    pub async fn insert(&self, product: Product) {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
    }

    pub async fn get(&self, id: &ProductId) -> Option<Product> {
        let products = self.products.read().await;
        products.get(&id.0).cloned()
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn load_catalog(&self) -> Result<CatalogSnapshot, CatalogError> {
        let products = self.products.read().await;
        let mut listed: Vec<Product> = products.values().cloned().collect();
        listed.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(CatalogSnapshot { products: listed, rejected: Vec::new() })
    }

    async fn apply_price_updates(&self, changes: &[PriceChange]) -> Result<u64, CatalogError> {
        let mut products = self.products.write().await;
        let mut updated = 0;
        for change in changes {
            if let Some(product) = products.get_mut(&change.product_id.0) {
                product.current_price = change.new_price.max(1);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[derive(Default)]
pub struct InMemoryCycleHistory {
    summaries: RwLock<Vec<CycleSummary>>,
}

#[async_trait::async_trait]
impl CycleRecorder for InMemoryCycleHistory {
    async fn record(&self, summary: &CycleSummary) -> Result<(), CatalogError> {
        let mut summaries = self.summaries.write().await;
        summaries.push(summary.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl CycleHistoryRepository for InMemoryCycleHistory {
    async fn recent(&self, limit: u32) -> Result<Vec<CycleSummary>, RepositoryError> {
        let summaries = self.summaries.read().await;
        Ok(summaries.iter().rev().take(limit as usize).cloned().collect())
    }
}
