use std::time::Duration;

use thiserror::Error;

use crate::domain::product::ProductId;

/// Failure to price a single product. The cycle skips the product and moves on.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("multiplier {multiplier} drawn outside configured range [{min}, {max}]")]
    MultiplierOutOfRange { multiplier: f64, min: f64, max: f64 },
    #[error("price for base {base_price} at multiplier {multiplier} does not fit in u64")]
    PriceOverflow { base_price: u64, multiplier: f64 },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("catalog write failed: {0}")]
    WriteFailed(String),
    #[error("malformed catalog record `{product_id}`: {reason}")]
    Malformed { product_id: ProductId, reason: String },
}

/// Cycle-level failures. A fetch failure aborts the cycle; a persist failure is
/// reported on the cycle summary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CycleError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout { stage: &'static str, after: Duration },
}
