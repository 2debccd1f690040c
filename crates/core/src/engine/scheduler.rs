use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Notify, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use super::cycle::PricingEngine;
use crate::config::SchedulerConfig;
use crate::domain::cycle::{CycleMode, CycleSummary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("pricing scheduler is already started")]
    AlreadyStarted,
    #[error("pricing scheduler must be started from inside a tokio runtime")]
    NoRuntime,
}

struct SchedulerInner {
    engine: Arc<PricingEngine>,
    cycle_guard: Arc<tokio::sync::Mutex<()>>,
    running: AtomicBool,
    skipped_ticks: AtomicU64,
    last_summary: RwLock<Option<CycleSummary>>,
}

/// Clears `running` when the cycle ends, including by panic.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SchedulerInner {
    /// Claims the cycle slot, or counts a skipped tick when a cycle is in flight.
    fn try_claim(&self, mode: CycleMode) -> Option<OwnedMutexGuard<()>> {
        match self.cycle_guard.clone().try_lock_owned() {
            Ok(guard) => Some(guard),
            Err(_) => {
                let skipped = self.skipped_ticks.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(
                    event_name = "pricing.cycle.overlap_skipped",
                    mode = mode.as_str(),
                    skipped_ticks = skipped,
                    "previous pricing cycle still running; skipping"
                );
                None
            }
        }
    }

    async fn run_claimed(&self, _slot: OwnedMutexGuard<()>, mode: CycleMode) -> CycleSummary {
        let summary = {
            let _running = RunningFlag::raise(&self.running);
            self.engine.run_cycle(mode).await
        };

        *self.last_summary.write().unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
        summary
    }

    /// Runs one cycle unless another is still in flight.
    async fn run_guarded(&self, mode: CycleMode) -> Option<CycleSummary> {
        let slot = self.try_claim(mode)?;
        Some(self.run_claimed(slot, mode).await)
    }
}

/// Fires a pricing cycle every `interval_secs` until stopped. At most one
/// cycle runs at a time; a tick that lands on a running cycle is dropped.
pub struct PricingScheduler {
    inner: Arc<SchedulerInner>,
    period: Duration,
    run_on_start: bool,
    shutdown: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PricingScheduler {
    pub fn new(engine: Arc<PricingEngine>, config: &SchedulerConfig) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                engine,
                cycle_guard: Arc::new(tokio::sync::Mutex::new(())),
                running: AtomicBool::new(false),
                skipped_ticks: AtomicU64::new(0),
                last_summary: RwLock::new(None),
            }),
            period: Duration::from_secs(config.interval_secs.max(1)),
            run_on_start: config.run_on_start,
            shutdown: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    pub fn start(&self) -> Result<(), SchedulerError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.is_some() {
            return Err(SchedulerError::AlreadyStarted);
        }

        let first_tick =
            if self.run_on_start { Instant::now() } else { Instant::now() + self.period };
        let period = self.period;
        let inner = self.inner.clone();
        let shutdown = self.shutdown.clone();

        info!(
            event_name = "pricing.scheduler.started",
            interval_secs = period.as_secs(),
            run_on_start = self.run_on_start,
            "dynamic pricing scheduler started"
        );

        *handle = Some(runtime.spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    _ = ticker.tick() => {
                        // The slot is claimed before spawning so `stop` always sees it held.
                        let Some(slot) = inner.try_claim(CycleMode::Apply) else {
                            continue;
                        };
                        let inner = inner.clone();
                        tokio::spawn(async move {
                            inner.run_claimed(slot, CycleMode::Apply).await;
                        });
                    }
                }
            }
        }));

        Ok(())
    }

    /// Stops ticking and waits for an in-flight cycle to finish.
    pub async fn stop(&self) {
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(handle) = handle else {
            return;
        };

        self.shutdown.notify_one();
        if let Err(join_error) = handle.await {
            warn!(
                event_name = "pricing.scheduler.join_failed",
                error = %join_error,
                "scheduler loop ended abnormally"
            );
        }
        let _drain = self.inner.cycle_guard.lock().await;

        info!(event_name = "pricing.scheduler.stopped", "dynamic pricing scheduler stopped");
    }

    /// Runs a cycle now, outside the tick schedule. Returns `None` when a
    /// cycle is already running.
    pub async fn run_once(&self, mode: CycleMode) -> Option<CycleSummary> {
        self.inner.run_guarded(mode).await
    }

    pub fn state(&self) -> SchedulerState {
        if self.inner.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_started(&self) -> bool {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn last_summary(&self) -> Option<CycleSummary> {
        self.inner.last_summary.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.inner.skipped_ticks.load(Ordering::SeqCst)
    }
}
