use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::catalog::CatalogStore;
use crate::domain::product::PriceChange;
use crate::errors::CycleError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub updated_count: u64,
    pub errors: Vec<String>,
}

/// Writes a cycle's price changes in a single bulk call.
pub struct BatchPersister {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl BatchPersister {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn persist(&self, changes: &[PriceChange]) -> PersistOutcome {
        if changes.is_empty() {
            return PersistOutcome::default();
        }

        let result = tokio::time::timeout(self.timeout, self.store.apply_price_updates(changes))
            .await
            .map_err(|_| CycleError::Timeout { stage: "price persist", after: self.timeout })
            .and_then(|written| written.map_err(CycleError::from));

        match result {
            Ok(updated_count) => {
                let mut errors = Vec::new();
                let requested = changes.len() as u64;
                if updated_count < requested {
                    let missing = requested - updated_count;
                    warn!(
                        event_name = "pricing.persist.unmatched",
                        requested,
                        updated = updated_count,
                        "some price updates matched no product"
                    );
                    errors.push(format!("{missing} price updates matched no product"));
                }
                PersistOutcome { updated_count, errors }
            }
            Err(error) => {
                warn!(
                    event_name = "pricing.persist.failed",
                    requested = changes.len(),
                    error = %error,
                    "bulk price write failed; next cycle will reconcile"
                );
                PersistOutcome { updated_count: 0, errors: vec![error.to_string()] }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::BatchPersister;
    use crate::domain::product::{PriceChange, ProductId};
    use crate::engine::catalog::{CatalogSnapshot, CatalogStore};
    use crate::errors::CatalogError;

    #[derive(Default)]
    struct CountingStore {
        writes: AtomicUsize,
        fail: bool,
        applied: Option<u64>,
    }

    #[async_trait]
    impl CatalogStore for CountingStore {
        async fn load_catalog(&self) -> Result<CatalogSnapshot, CatalogError> {
            Ok(CatalogSnapshot::default())
        }

        async fn apply_price_updates(&self, changes: &[PriceChange]) -> Result<u64, CatalogError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogError::WriteFailed("disk full".to_string()));
            }
            Ok(self.applied.unwrap_or(changes.len() as u64))
        }
    }

    fn change(id: &str, new_price: u64) -> PriceChange {
        PriceChange {
            product_id: ProductId(id.to_string()),
            product_name: id.to_string(),
            previous_price: 100,
            new_price,
        }
    }

    #[tokio::test]
    async fn empty_batch_issues_no_write() {
        let store = Arc::new(CountingStore::default());
        let persister = BatchPersister::new(store.clone(), Duration::from_secs(5));

        let outcome = persister.persist(&[]).await;

        assert_eq!(outcome.updated_count, 0);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whole_batch_goes_out_in_one_write() {
        let store = Arc::new(CountingStore::default());
        let persister = BatchPersister::new(store.clone(), Duration::from_secs(5));

        let outcome = persister.persist(&[change("a", 90), change("b", 80), change("c", 70)]).await;

        assert_eq!(outcome.updated_count, 3);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_write_is_reported_once() {
        let store = Arc::new(CountingStore { fail: true, ..CountingStore::default() });
        let persister = BatchPersister::new(store, Duration::from_secs(5));

        let outcome = persister.persist(&[change("a", 90), change("b", 80)]).await;

        assert_eq!(outcome.updated_count, 0);
        assert_eq!(outcome.errors, vec!["catalog write failed: disk full".to_string()]);
    }

    #[tokio::test]
    async fn unmatched_updates_are_surfaced() {
        let store = Arc::new(CountingStore { applied: Some(1), ..CountingStore::default() });
        let persister = BatchPersister::new(store, Duration::from_secs(5));

        let outcome = persister.persist(&[change("a", 90), change("gone", 80)]).await;

        assert_eq!(outcome.updated_count, 1);
        assert_eq!(outcome.errors, vec!["1 price updates matched no product".to_string()]);
    }
}
