use std::sync::Arc;

use dynaprice_core::config::AppConfig;
use dynaprice_core::engine::{CycleRecorder, PricingEngine, PricingScheduler};
use dynaprice_db::{connect_with_settings, migrations, DbPool, SqlCatalogStore, SqlCycleHistory};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub scheduler: Arc<PricingScheduler>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// Connects, migrates, and wires the pricing engine to the SQLite catalog.
/// The scheduler is returned unstarted.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let mut engine = PricingEngine::new(
        Arc::new(SqlCatalogStore::new(db_pool.clone())),
        config.pricing.clone(),
        &config.scheduler,
    );
    if config.scheduler.record_history {
        let history: Arc<dyn CycleRecorder> = Arc::new(SqlCycleHistory::new(db_pool.clone()));
        engine = engine.with_recorder(history);
    }
    let scheduler = Arc::new(PricingScheduler::new(Arc::new(engine), &config.scheduler));

    info!(
        event_name = "system.bootstrap.pricing_ready",
        correlation_id = "bootstrap",
        strategy = %config.pricing.strategy,
        interval_secs = config.scheduler.interval_secs,
        record_history = config.scheduler.record_history,
        "pricing engine wired"
    );

    Ok(Application { config, db_pool, scheduler })
}
