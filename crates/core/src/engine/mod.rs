pub mod catalog;
pub mod clock;
pub mod cycle;
pub mod persister;
pub mod scheduler;

pub use catalog::{CatalogSnapshot, CatalogStore, CycleRecorder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cycle::PricingEngine;
pub use persister::{BatchPersister, PersistOutcome};
pub use scheduler::{PricingScheduler, SchedulerError, SchedulerState};
