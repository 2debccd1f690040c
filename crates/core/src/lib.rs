pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod pricing;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::cycle::{CycleId, CycleMode, CycleOutcome, CycleSummary};
pub use domain::product::{PriceChange, Product, ProductId};
pub use engine::{
    BatchPersister, CatalogSnapshot, CatalogStore, Clock, CycleRecorder, ManualClock,
    PersistOutcome, PricingEngine, PricingScheduler, SchedulerError, SchedulerState, SystemClock,
};
pub use errors::{CatalogError, CycleError, PricingError};
pub use pricing::{
    classify, compute_price, price_product, Classification, MultiplierRange, MultiplierSource,
    MultiplierTable, PinnedMultiplier, PricingRule, PricingStrategy, RandomMultiplier,
};
