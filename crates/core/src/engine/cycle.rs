use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::catalog::{CatalogSnapshot, CatalogStore, CycleRecorder};
use super::clock::{Clock, SystemClock};
use super::persister::BatchPersister;
use crate::config::{PricingConfig, SchedulerConfig};
use crate::domain::cycle::{CycleId, CycleMode, CycleOutcome, CycleSummary};
use crate::domain::product::{PriceChange, Product};
use crate::errors::CycleError;
use crate::pricing::{price_product, MultiplierSource, RandomMultiplier};

/// One pricing pass: fetch the catalog, reprice every product, write back the
/// changed prices in bulk.
///
/// The engine holds no lock across awaits; the multiplier source is only
/// borrowed while prices are computed.
pub struct PricingEngine {
    store: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    source: Mutex<Box<dyn MultiplierSource>>,
    recorder: Option<Arc<dyn CycleRecorder>>,
    persister: BatchPersister,
    pricing: PricingConfig,
    store_timeout: Duration,
    log_sample_size: usize,
}

struct Repriced {
    changes: Vec<PriceChange>,
    skipped: u64,
}

impl PricingEngine {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        pricing: PricingConfig,
        scheduler: &SchedulerConfig,
    ) -> Self {
        let store_timeout = Duration::from_secs(scheduler.store_timeout_secs);
        Self {
            persister: BatchPersister::new(store.clone(), store_timeout),
            store,
            clock: Arc::new(SystemClock),
            source: Mutex::new(Box::new(RandomMultiplier::from_entropy())),
            recorder: None,
            pricing,
            store_timeout,
            log_sample_size: scheduler.log_sample_size,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_multiplier_source(mut self, source: Box<dyn MultiplierSource>) -> Self {
        self.source = Mutex::new(source);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn CycleRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub async fn run_cycle(&self, mode: CycleMode) -> CycleSummary {
        let cycle_id = CycleId::generate();
        let started_at = self.clock.now();
        info!(
            event_name = "pricing.cycle.started",
            correlation_id = %cycle_id,
            mode = mode.as_str(),
            strategy = %self.pricing.strategy,
            "running dynamic pricing cycle"
        );

        let snapshot = match self.fetch_catalog().await {
            Ok(snapshot) => snapshot,
            Err(fetch_error) => {
                error!(
                    event_name = "pricing.cycle.aborted",
                    correlation_id = %cycle_id,
                    error = %fetch_error,
                    "catalog fetch failed; cycle aborted until next tick"
                );
                let summary = CycleSummary {
                    cycle_id,
                    mode,
                    strategy: self.pricing.strategy,
                    started_at,
                    finished_at: self.clock.now(),
                    scanned: 0,
                    changed: 0,
                    updated: 0,
                    skipped: 0,
                    errors: vec![fetch_error.to_string()],
                    outcome: CycleOutcome::Aborted,
                };
                self.record(&summary, mode).await;
                return summary;
            }
        };

        for rejected in &snapshot.rejected {
            warn!(
                event_name = "pricing.product.skipped",
                correlation_id = %cycle_id,
                error = %rejected,
                "skipping malformed catalog record"
            );
        }

        let scanned = snapshot.scanned() as u64;
        let repriced = self.reprice(&cycle_id, &snapshot.products, started_at);
        let skipped = repriced.skipped + snapshot.rejected.len() as u64;
        let changed = repriced.changes.len() as u64;

        let (updated, errors) = match mode {
            CycleMode::Apply => {
                let outcome = self.persister.persist(&repriced.changes).await;
                (outcome.updated_count, outcome.errors)
            }
            CycleMode::DryRun => (0, Vec::new()),
        };

        let outcome = if skipped > 0 || !errors.is_empty() {
            CycleOutcome::PartialFailure
        } else {
            CycleOutcome::Completed
        };

        let summary = CycleSummary {
            cycle_id,
            mode,
            strategy: self.pricing.strategy,
            started_at,
            finished_at: self.clock.now(),
            scanned,
            changed,
            updated,
            skipped,
            errors,
            outcome,
        };

        info!(
            event_name = "pricing.cycle.completed",
            correlation_id = %summary.cycle_id,
            mode = mode.as_str(),
            outcome = %summary.outcome,
            scanned = summary.scanned,
            changed = summary.changed,
            updated = summary.updated,
            skipped = summary.skipped,
            "dynamic pricing cycle finished"
        );

        self.record(&summary, mode).await;
        summary
    }

    async fn fetch_catalog(&self) -> Result<CatalogSnapshot, CycleError> {
        tokio::time::timeout(self.store_timeout, self.store.load_catalog())
            .await
            .map_err(|_| CycleError::Timeout { stage: "catalog fetch", after: self.store_timeout })?
            .map_err(CycleError::from)
    }

    fn reprice(&self, cycle_id: &CycleId, products: &[Product], now: DateTime<Utc>) -> Repriced {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changes = Vec::new();
        let mut skipped = 0;

        for product in products {
            let decision = match price_product(product, now, &self.pricing, source.as_mut()) {
                Ok(decision) => decision,
                Err(pricing_error) => {
                    skipped += 1;
                    warn!(
                        event_name = "pricing.product.skipped",
                        correlation_id = %cycle_id,
                        product_id = %product.id,
                        error = %pricing_error,
                        "could not price product; skipping"
                    );
                    continue;
                }
            };

            if decision.price == product.current_price {
                continue;
            }

            if changes.len() < self.log_sample_size {
                info!(
                    event_name = "pricing.product.repriced",
                    correlation_id = %cycle_id,
                    product_id = %product.id,
                    product_name = %product.name,
                    basis = %decision.basis,
                    previous_price = product.current_price,
                    new_price = decision.price,
                    "product repriced"
                );
            }

            changes.push(PriceChange {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                previous_price: product.current_price,
                new_price: decision.price,
            });
        }

        Repriced { changes, skipped }
    }

    async fn record(&self, summary: &CycleSummary, mode: CycleMode) {
        if mode == CycleMode::DryRun {
            return;
        }
        let Some(recorder) = &self.recorder else {
            return;
        };
        if let Err(record_error) = recorder.record(summary).await {
            warn!(
                event_name = "pricing.cycle.history_failed",
                correlation_id = %summary.cycle_id,
                error = %record_error,
                "could not record cycle history"
            );
        }
    }
}
