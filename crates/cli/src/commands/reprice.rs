use std::sync::Arc;

use dynaprice_core::config::{ConfigOverrides, LoadOptions};
use dynaprice_core::domain::cycle::{CycleMode, CycleOutcome, CycleSummary};
use dynaprice_core::engine::{CycleRecorder, PricingEngine};
use dynaprice_core::pricing::PricingStrategy;
use dynaprice_db::{SqlCatalogStore, SqlCycleHistory};

use crate::commands::{init_logging, open_migrated, prepare, CommandResult};

/// Runs one pricing cycle against the configured catalog and exits.
pub fn run(dry_run: bool, strategy: Option<PricingStrategy>) -> CommandResult {
    let options = LoadOptions {
        overrides: ConfigOverrides { pricing_strategy: strategy, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    };
    let (config, runtime) = match prepare("reprice", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    init_logging(&config.logging);
    let mode = if dry_run { CycleMode::DryRun } else { CycleMode::Apply };

    let result = runtime.block_on(async {
        let pool = open_migrated(&config).await?;

        let mut engine = PricingEngine::new(
            Arc::new(SqlCatalogStore::new(pool.clone())),
            config.pricing.clone(),
            &config.scheduler,
        );
        if config.scheduler.record_history {
            let history: Arc<dyn CycleRecorder> = Arc::new(SqlCycleHistory::new(pool.clone()));
            engine = engine.with_recorder(history);
        }

        let summary = engine.run_cycle(mode).await;
        pool.close().await;
        Ok::<CycleSummary, crate::commands::CommandFailure>(summary)
    });

    match result {
        Ok(summary) if summary.outcome == CycleOutcome::Aborted => CommandResult::failure(
            "reprice",
            "cycle_aborted",
            format!("pricing cycle aborted: {}", summary.errors.join("; ")),
            7,
        ),
        Ok(summary) => CommandResult::success("reprice", describe(&summary)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("reprice", error_class, message, exit_code)
        }
    }
}

fn describe(summary: &CycleSummary) -> String {
    let mut message = format!(
        "{} cycle {} ({}, {}): scanned={} changed={} updated={} skipped={}",
        summary.mode.as_str(),
        summary.cycle_id,
        summary.strategy,
        summary.outcome,
        summary.scanned,
        summary.changed,
        summary.updated,
        summary.skipped,
    );
    if summary.changed == 0 {
        message.push_str("; no dynamic price updates needed");
    }
    if !summary.errors.is_empty() {
        message.push_str(&format!("; errors: {}", summary.errors.join("; ")));
    }
    message
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use dynaprice_core::domain::cycle::{CycleId, CycleMode, CycleOutcome, CycleSummary};
    use dynaprice_core::pricing::PricingStrategy;

    use super::describe;

    fn summary(changed: u64, errors: Vec<String>) -> CycleSummary {
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        CycleSummary {
            cycle_id: CycleId("c-1".to_string()),
            mode: CycleMode::DryRun,
            strategy: PricingStrategy::Tiered,
            started_at: at,
            finished_at: at,
            scanned: 4,
            changed,
            updated: 0,
            skipped: 0,
            errors,
            outcome: CycleOutcome::Completed,
        }
    }

    #[test]
    fn quiet_cycle_says_nothing_needed_changing() {
        assert_eq!(
            describe(&summary(0, Vec::new())),
            "dry_run cycle c-1 (tiered, completed): scanned=4 changed=0 updated=0 skipped=0; \
             no dynamic price updates needed"
        );
    }

    #[test]
    fn errors_are_appended() {
        let message = describe(&summary(2, vec!["disk full".to_string()]));

        assert!(message.ends_with("; errors: disk full"));
        assert!(!message.contains("no dynamic price updates needed"));
    }
}
