use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::{LegacyRule, MultiplierRange, MultiplierTable, PricingStrategy};

/// Brands whose clearance discounts are kept shallower than commodity listings.
pub const DEFAULT_PREMIUM_BRANDS: &[&str] = &[
    "apple", "samsung", "sony", "nike", "adidas", "puma", "gucci", "rolex", "dell", "hp",
    "lenovo", "asus", "boat", "jbl", "oneplus",
];

/// Ten years.
const MAX_NEW_PRODUCT_WINDOW_HOURS: u64 = 24 * 365 * 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub scheduler: SchedulerConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricingConfig {
    pub strategy: PricingStrategy,
    pub demand_sales_threshold: u64,
    pub demand_views_threshold: u64,
    pub low_stock_threshold: u64,
    pub new_product_window_hours: u64,
    pub premium_brands: Vec<String>,
    pub multipliers: MultiplierTable,
    pub legacy: LegacyRule,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    pub store_timeout_secs: u64,
    pub run_on_start: bool,
    pub log_sample_size: usize,
    pub record_history: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub pricing_strategy: Option<PricingStrategy>,
    pub scheduler_interval_secs: Option<u64>,
    pub scheduler_run_on_start: Option<bool>,
    pub premium_brands: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://dynaprice.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pricing: PricingConfig::default(),
            scheduler: SchedulerConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            strategy: PricingStrategy::Tiered,
            demand_sales_threshold: 5,
            demand_views_threshold: 50,
            low_stock_threshold: 10,
            new_product_window_hours: 72,
            premium_brands: DEFAULT_PREMIUM_BRANDS.iter().map(|brand| brand.to_string()).collect(),
            multipliers: MultiplierTable::default(),
            legacy: LegacyRule::default(),
        }
    }
}

impl PricingConfig {
    pub fn new_product_window(&self) -> chrono::Duration {
        let hours = self.new_product_window_hours.min(MAX_NEW_PRODUCT_WINDOW_HOURS);
        chrono::Duration::hours(hours as i64)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            store_timeout_secs: 30,
            run_on_start: false,
            log_sample_size: 5,
            record_history: true,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dynaprice.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.pricing.premium_brands = normalize_brands(&config.pricing.premium_brands);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(pricing) = patch.pricing {
            if let Some(strategy) = pricing.strategy {
                self.pricing.strategy = strategy;
            }
            if let Some(threshold) = pricing.demand_sales_threshold {
                self.pricing.demand_sales_threshold = threshold;
            }
            if let Some(threshold) = pricing.demand_views_threshold {
                self.pricing.demand_views_threshold = threshold;
            }
            if let Some(threshold) = pricing.low_stock_threshold {
                self.pricing.low_stock_threshold = threshold;
            }
            if let Some(hours) = pricing.new_product_window_hours {
                self.pricing.new_product_window_hours = hours;
            }
            if let Some(brands) = pricing.premium_brands {
                self.pricing.premium_brands = brands;
            }
            if let Some(multipliers) = pricing.multipliers {
                multipliers.apply_to(&mut self.pricing.multipliers);
            }
            if let Some(legacy) = pricing.legacy {
                if let Some(sales_threshold) = legacy.sales_threshold {
                    self.pricing.legacy.sales_threshold = sales_threshold;
                }
                if let Some(discount) = legacy.discount {
                    self.pricing.legacy.discount = discount;
                }
            }
        }

        if let Some(scheduler) = patch.scheduler {
            if let Some(interval_secs) = scheduler.interval_secs {
                self.scheduler.interval_secs = interval_secs;
            }
            if let Some(store_timeout_secs) = scheduler.store_timeout_secs {
                self.scheduler.store_timeout_secs = store_timeout_secs;
            }
            if let Some(run_on_start) = scheduler.run_on_start {
                self.scheduler.run_on_start = run_on_start;
            }
            if let Some(log_sample_size) = scheduler.log_sample_size {
                self.scheduler.log_sample_size = log_sample_size;
            }
            if let Some(record_history) = scheduler.record_history {
                self.scheduler.record_history = record_history;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DYNAPRICE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DYNAPRICE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("DYNAPRICE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("DYNAPRICE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DYNAPRICE_PRICING_STRATEGY") {
            self.pricing.strategy = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "DYNAPRICE_PRICING_STRATEGY".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = read_env("DYNAPRICE_PRICING_DEMAND_SALES_THRESHOLD") {
            self.pricing.demand_sales_threshold =
                parse_u64("DYNAPRICE_PRICING_DEMAND_SALES_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_PRICING_DEMAND_VIEWS_THRESHOLD") {
            self.pricing.demand_views_threshold =
                parse_u64("DYNAPRICE_PRICING_DEMAND_VIEWS_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_PRICING_LOW_STOCK_THRESHOLD") {
            self.pricing.low_stock_threshold =
                parse_u64("DYNAPRICE_PRICING_LOW_STOCK_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_PRICING_NEW_PRODUCT_WINDOW_HOURS") {
            self.pricing.new_product_window_hours =
                parse_u64("DYNAPRICE_PRICING_NEW_PRODUCT_WINDOW_HOURS", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_PRICING_PREMIUM_BRANDS") {
            self.pricing.premium_brands = value.split(',').map(str::to_string).collect();
        }

        if let Some(value) = read_env("DYNAPRICE_SCHEDULER_INTERVAL_SECS") {
            self.scheduler.interval_secs = parse_u64("DYNAPRICE_SCHEDULER_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_SCHEDULER_STORE_TIMEOUT_SECS") {
            self.scheduler.store_timeout_secs =
                parse_u64("DYNAPRICE_SCHEDULER_STORE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_SCHEDULER_RUN_ON_START") {
            self.scheduler.run_on_start = parse_bool("DYNAPRICE_SCHEDULER_RUN_ON_START", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_SCHEDULER_LOG_SAMPLE_SIZE") {
            self.scheduler.log_sample_size =
                parse_usize("DYNAPRICE_SCHEDULER_LOG_SAMPLE_SIZE", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_SCHEDULER_RECORD_HISTORY") {
            self.scheduler.record_history =
                parse_bool("DYNAPRICE_SCHEDULER_RECORD_HISTORY", &value)?;
        }

        if let Some(value) = read_env("DYNAPRICE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DYNAPRICE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("DYNAPRICE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("DYNAPRICE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("DYNAPRICE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("DYNAPRICE_LOGGING_LEVEL").or_else(|| read_env("DYNAPRICE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("DYNAPRICE_LOGGING_FORMAT").or_else(|| read_env("DYNAPRICE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(strategy) = overrides.pricing_strategy {
            self.pricing.strategy = strategy;
        }
        if let Some(interval_secs) = overrides.scheduler_interval_secs {
            self.scheduler.interval_secs = interval_secs;
        }
        if let Some(run_on_start) = overrides.scheduler_run_on_start {
            self.scheduler.run_on_start = run_on_start;
        }
        if let Some(premium_brands) = overrides.premium_brands {
            self.pricing.premium_brands = premium_brands;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_pricing(&self.pricing)?;
        validate_scheduler(&self.scheduler)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dynaprice.toml"), PathBuf::from("config/dynaprice.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn normalize_brands(brands: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = brands
        .iter()
        .map(|brand| brand.trim().to_lowercase())
        .filter(|brand| !brand.is_empty())
        .collect();
    normalized.dedup();
    normalized
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    if pricing.low_stock_threshold == 0 {
        return Err(ConfigError::Validation(
            "pricing.low_stock_threshold must be greater than zero".to_string(),
        ));
    }

    if pricing.new_product_window_hours == 0
        || pricing.new_product_window_hours > MAX_NEW_PRODUCT_WINDOW_HOURS
    {
        return Err(ConfigError::Validation(format!(
            "pricing.new_product_window_hours must be between 1 and {MAX_NEW_PRODUCT_WINDOW_HOURS}"
        )));
    }

    if pricing.premium_brands.iter().any(|brand| brand.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "pricing.premium_brands must not contain empty entries".to_string(),
        ));
    }

    for (rule, range) in pricing.multipliers.entries() {
        validate_range(&format!("pricing.multipliers.{rule}"), range)?;
    }
    validate_range("pricing.legacy.discount", pricing.legacy.discount)?;

    Ok(())
}

fn validate_range(key: &str, range: MultiplierRange) -> Result<(), ConfigError> {
    if !range.is_valid() {
        return Err(ConfigError::Validation(format!(
            "{key} must satisfy 0 <= min <= max with finite bounds (got min={}, max={})",
            range.min, range.max
        )));
    }
    Ok(())
}

fn validate_scheduler(scheduler: &SchedulerConfig) -> Result<(), ConfigError> {
    if scheduler.interval_secs == 0 {
        return Err(ConfigError::Validation(
            "scheduler.interval_secs must be greater than zero".to_string(),
        ));
    }

    if scheduler.store_timeout_secs == 0 || scheduler.store_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "scheduler.store_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    pricing: Option<PricingPatch>,
    scheduler: Option<SchedulerPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    strategy: Option<PricingStrategy>,
    demand_sales_threshold: Option<u64>,
    demand_views_threshold: Option<u64>,
    low_stock_threshold: Option<u64>,
    new_product_window_hours: Option<u64>,
    premium_brands: Option<Vec<String>>,
    multipliers: Option<MultiplierTablePatch>,
    legacy: Option<LegacyPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct MultiplierTablePatch {
    scarcity: Option<MultiplierRange>,
    high_demand: Option<MultiplierRange>,
    new_listing: Option<MultiplierRange>,
    premium_low_stock: Option<MultiplierRange>,
    standard_low_stock: Option<MultiplierRange>,
    premium_clearance: Option<MultiplierRange>,
    standard_clearance: Option<MultiplierRange>,
}

impl MultiplierTablePatch {
    fn apply_to(self, table: &mut MultiplierTable) {
        if let Some(range) = self.scarcity {
            table.scarcity = range;
        }
        if let Some(range) = self.high_demand {
            table.high_demand = range;
        }
        if let Some(range) = self.new_listing {
            table.new_listing = range;
        }
        if let Some(range) = self.premium_low_stock {
            table.premium_low_stock = range;
        }
        if let Some(range) = self.standard_low_stock {
            table.standard_low_stock = range;
        }
        if let Some(range) = self.premium_clearance {
            table.premium_clearance = range;
        }
        if let Some(range) = self.standard_clearance {
            table.standard_clearance = range;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LegacyPatch {
    sales_threshold: Option<u64>,
    discount: Option<MultiplierRange>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulerPatch {
    interval_secs: Option<u64>,
    store_timeout_secs: Option<u64>,
    run_on_start: Option<bool>,
    log_sample_size: Option<usize>,
    record_history: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::pricing::{MultiplierRange, PricingStrategy};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_observed_deployment() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.scheduler.interval_secs == 600, "default interval is ten minutes")?;
        ensure(config.pricing.demand_sales_threshold == 5, "sales threshold defaults to 5")?;
        ensure(config.pricing.demand_views_threshold == 50, "views threshold defaults to 50")?;
        ensure(config.pricing.low_stock_threshold == 10, "low stock threshold defaults to 10")?;
        ensure(config.pricing.new_product_window_hours == 72, "new window defaults to 3 days")?;
        ensure(config.pricing.strategy == PricingStrategy::Tiered, "tiered is the default")?;
        ensure(
            config.pricing.premium_brands.iter().any(|brand| brand == "nike"),
            "default brand list includes nike",
        )?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logs by default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_DYNAPRICE_DB", "sqlite://interpolated.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("dynaprice.toml");
            fs::write(
                &path,
                r#"
[database]
url = "${TEST_DYNAPRICE_DB}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://interpolated.db",
                "database url should be loaded from environment",
            )
        })();

        clear_vars(&["TEST_DYNAPRICE_DB"]);
        result
    }

    #[test]
    fn file_overrides_pricing_table_rows_individually() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("dynaprice.toml");
        fs::write(
            &path,
            r#"
[pricing]
strategy = "legacy"
premium_brands = ["  Acme ", "NIKE", ""]

[pricing.multipliers]
scarcity = { min = 1.05, max = 1.20 }

[scheduler]
interval_secs = 60
run_on_start = true
"#,
        )
        .map_err(|err| err.to_string())?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.strategy == PricingStrategy::Legacy, "strategy from file")?;
        ensure(
            config.pricing.multipliers.scarcity == MultiplierRange::new(1.05, 1.20),
            "scarcity row replaced",
        )?;
        ensure(
            config.pricing.multipliers.high_demand == MultiplierRange::new(0.90, 1.00),
            "untouched rows keep their defaults",
        )?;
        ensure(
            config.pricing.premium_brands == vec!["acme".to_string(), "nike".to_string()],
            "brands are trimmed, lower-cased and empty entries dropped",
        )?;
        ensure(config.scheduler.interval_secs == 60, "one-minute interval from file")?;
        ensure(config.scheduler.run_on_start, "run_on_start from file")
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DYNAPRICE_LOG_LEVEL", "warn");
        env::set_var("DYNAPRICE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["DYNAPRICE_LOG_LEVEL", "DYNAPRICE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DYNAPRICE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("DYNAPRICE_SCHEDULER_INTERVAL_SECS", "120");
        env::set_var("DYNAPRICE_PRICING_PREMIUM_BRANDS", "Acme,Globex");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("dynaprice.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[scheduler]
interval_secs = 60

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.scheduler.interval_secs == 120, "env interval should win over file")?;
            ensure(
                config.pricing.premium_brands == vec!["acme".to_string(), "globex".to_string()],
                "env brand list replaces the default list",
            )
        })();

        clear_vars(&[
            "DYNAPRICE_DATABASE_URL",
            "DYNAPRICE_SCHEDULER_INTERVAL_SECS",
            "DYNAPRICE_PRICING_PREMIUM_BRANDS",
        ]);
        result
    }

    #[test]
    fn inverted_multiplier_range_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("dynaprice.toml");
        fs::write(
            &path,
            r#"
[pricing.multipliers]
standard_clearance = { min = 0.5, max = 0.4 }
"#,
        )
        .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };

        let has_message = matches!(
            error,
            ConfigError::Validation(ref message)
                if message.contains("pricing.multipliers.standard_clearance")
        );
        ensure(has_message, "validation failure should name the offending table row")
    }

    #[test]
    fn invalid_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("DYNAPRICE_SCHEDULER_INTERVAL_SECS", "soon");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected env override failure".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "DYNAPRICE_SCHEDULER_INTERVAL_SECS"
                ),
                "error should name the env key",
            )
        })();

        clear_vars(&["DYNAPRICE_SCHEDULER_INTERVAL_SECS"]);
        result
    }

    #[test]
    fn zero_interval_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                scheduler_interval_secs: Some(0),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        ensure(
            matches!(
                result,
                Err(ConfigError::Validation(ref message)) if message.contains("scheduler.interval_secs")
            ),
            "zero interval should fail validation",
        )
    }
}
