use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dynaprice_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// One reported key: its dotted path, the env vars that can override it
/// (first match wins), and how to render the effective value.
struct ConfigField {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    render: fn(&AppConfig) -> String,
}

const FIELDS: &[ConfigField] = &[
    ConfigField {
        key_path: "database.url",
        env_keys: &["DYNAPRICE_DATABASE_URL"],
        render: |config| config.database.url.clone(),
    },
    ConfigField {
        key_path: "database.max_connections",
        env_keys: &["DYNAPRICE_DATABASE_MAX_CONNECTIONS"],
        render: |config| config.database.max_connections.to_string(),
    },
    ConfigField {
        key_path: "database.timeout_secs",
        env_keys: &["DYNAPRICE_DATABASE_TIMEOUT_SECS"],
        render: |config| config.database.timeout_secs.to_string(),
    },
    ConfigField {
        key_path: "pricing.strategy",
        env_keys: &["DYNAPRICE_PRICING_STRATEGY"],
        render: |config| config.pricing.strategy.to_string(),
    },
    ConfigField {
        key_path: "pricing.demand_sales_threshold",
        env_keys: &["DYNAPRICE_PRICING_DEMAND_SALES_THRESHOLD"],
        render: |config| config.pricing.demand_sales_threshold.to_string(),
    },
    ConfigField {
        key_path: "pricing.demand_views_threshold",
        env_keys: &["DYNAPRICE_PRICING_DEMAND_VIEWS_THRESHOLD"],
        render: |config| config.pricing.demand_views_threshold.to_string(),
    },
    ConfigField {
        key_path: "pricing.low_stock_threshold",
        env_keys: &["DYNAPRICE_PRICING_LOW_STOCK_THRESHOLD"],
        render: |config| config.pricing.low_stock_threshold.to_string(),
    },
    ConfigField {
        key_path: "pricing.new_product_window_hours",
        env_keys: &["DYNAPRICE_PRICING_NEW_PRODUCT_WINDOW_HOURS"],
        render: |config| config.pricing.new_product_window_hours.to_string(),
    },
    ConfigField {
        key_path: "pricing.premium_brands",
        env_keys: &["DYNAPRICE_PRICING_PREMIUM_BRANDS"],
        render: |config| config.pricing.premium_brands.join(","),
    },
    ConfigField {
        key_path: "scheduler.interval_secs",
        env_keys: &["DYNAPRICE_SCHEDULER_INTERVAL_SECS"],
        render: |config| config.scheduler.interval_secs.to_string(),
    },
    ConfigField {
        key_path: "scheduler.store_timeout_secs",
        env_keys: &["DYNAPRICE_SCHEDULER_STORE_TIMEOUT_SECS"],
        render: |config| config.scheduler.store_timeout_secs.to_string(),
    },
    ConfigField {
        key_path: "scheduler.run_on_start",
        env_keys: &["DYNAPRICE_SCHEDULER_RUN_ON_START"],
        render: |config| config.scheduler.run_on_start.to_string(),
    },
    ConfigField {
        key_path: "scheduler.log_sample_size",
        env_keys: &["DYNAPRICE_SCHEDULER_LOG_SAMPLE_SIZE"],
        render: |config| config.scheduler.log_sample_size.to_string(),
    },
    ConfigField {
        key_path: "scheduler.record_history",
        env_keys: &["DYNAPRICE_SCHEDULER_RECORD_HISTORY"],
        render: |config| config.scheduler.record_history.to_string(),
    },
    ConfigField {
        key_path: "server.bind_address",
        env_keys: &["DYNAPRICE_SERVER_BIND_ADDRESS"],
        render: |config| config.server.bind_address.clone(),
    },
    ConfigField {
        key_path: "server.health_check_port",
        env_keys: &["DYNAPRICE_SERVER_HEALTH_CHECK_PORT"],
        render: |config| config.server.health_check_port.to_string(),
    },
    ConfigField {
        key_path: "server.graceful_shutdown_secs",
        env_keys: &["DYNAPRICE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        render: |config| config.server.graceful_shutdown_secs.to_string(),
    },
    ConfigField {
        key_path: "logging.level",
        env_keys: &["DYNAPRICE_LOGGING_LEVEL", "DYNAPRICE_LOG_LEVEL"],
        render: |config| config.logging.level.clone(),
    },
    ConfigField {
        key_path: "logging.format",
        env_keys: &["DYNAPRICE_LOGGING_FORMAT", "DYNAPRICE_LOG_FORMAT"],
        render: |config| format!("{:?}", config.logging.format).to_ascii_lowercase(),
    },
];

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(FIELDS.iter().map(|field| {
        render_line(
            field.key_path,
            &(field.render)(&config),
            field_source(
                field.key_path,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        )
    }));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("dynaprice.toml"), PathBuf::from("config/dynaprice.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
