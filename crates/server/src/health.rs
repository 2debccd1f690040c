use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use dynaprice_core::domain::cycle::{CycleOutcome, CycleSummary};
use dynaprice_core::engine::{PricingScheduler, SchedulerState};
use dynaprice_db::DbPool;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    scheduler: Arc<PricingScheduler>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LastCycle {
    pub cycle_id: String,
    pub outcome: CycleOutcome,
    pub finished_at: String,
    pub scanned: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl From<CycleSummary> for LastCycle {
    fn from(summary: CycleSummary) -> Self {
        Self {
            cycle_id: summary.cycle_id.0,
            outcome: summary.outcome,
            finished_at: summary.finished_at.to_rfc3339(),
            scanned: summary.scanned,
            updated: summary.updated,
            skipped: summary.skipped,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PricingHealth {
    pub status: &'static str,
    pub scheduler_started: bool,
    pub state: SchedulerState,
    pub skipped_ticks: u64,
    pub last_cycle: Option<LastCycle>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub pricing: PricingHealth,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, scheduler: Arc<PricingScheduler>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, scheduler })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    db_pool: DbPool,
    scheduler: Arc<PricingScheduler>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool, scheduler)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let pricing = pricing_check(&state.scheduler);
    let database_ready = database.status == "ready";

    let payload = HealthResponse {
        status: if database_ready && pricing.status == "ready" { "ready" } else { "degraded" },
        database,
        pricing,
        checked_at: Utc::now().to_rfc3339(),
    };

    // A failed cycle self-heals on the next tick; only the database gates readiness.
    let status_code = if database_ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

fn pricing_check(scheduler: &PricingScheduler) -> PricingHealth {
    let last_cycle = scheduler.last_summary().map(LastCycle::from);
    let aborted = last_cycle.as_ref().is_some_and(|cycle| cycle.outcome == CycleOutcome::Aborted);

    PricingHealth {
        status: if aborted { "degraded" } else { "ready" },
        scheduler_started: scheduler.is_started(),
        state: scheduler.state(),
        skipped_ticks: scheduler.skipped_ticks(),
        last_cycle,
    }
}
