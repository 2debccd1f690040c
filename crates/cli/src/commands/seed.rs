use chrono::Utc;
use dynaprice_core::config::LoadOptions;
use dynaprice_db::DemoCatalog;

use crate::commands::{open_migrated, prepare, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed", LoadOptions::default()) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated(&config).await?;

        let seed_result = DemoCatalog::load(&pool, Utc::now())
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<Vec<&'static str>, CommandFailure> = if verification.all_present {
            Ok(seed_result.products_seeded)
        } else {
            let failed = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            Err(("seed_verification", verification_failure_message(&failed), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(products) => {
            let lines: Vec<String> = products.iter().map(|id| format!("  - {id}")).collect();
            CommandResult::success(
                "seed",
                format!(
                    "demo catalog loaded at base prices ({} products):\n{}",
                    products.len(),
                    lines.join("\n")
                ),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_failure_message(failed: &[&str]) -> String {
    if failed.is_empty() {
        "some demo products failed to load".to_string()
    } else {
        format!("seed verification failed for products: {}", failed.join(", "))
    }
}
