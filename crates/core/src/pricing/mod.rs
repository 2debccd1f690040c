pub mod calculator;
pub mod classifier;
pub mod legacy;
pub mod multiplier;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;
use crate::domain::product::Product;
use crate::errors::PricingError;

pub use calculator::{compute_price, select_rule, MultiplierTable, PricingRule};
pub use classifier::{classify, AgeBucket, BrandTier, Classification, DemandLevel, StockLevel};
pub use legacy::{legacy_price, LegacyRule};
pub use multiplier::{MultiplierRange, MultiplierSource, PinnedMultiplier, RandomMultiplier};

/// Which rule set a cycle prices with. Only one is ever active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    #[default]
    Tiered,
    Legacy,
}

impl PricingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tiered => "tiered",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PricingStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tiered" => Ok(Self::Tiered),
            "legacy" => Ok(Self::Legacy),
            other => {
                Err(format!("unsupported pricing strategy `{other}` (expected tiered|legacy)"))
            }
        }
    }
}

/// How a price was arrived at, kept for sample logging.
#[derive(Clone, Debug, PartialEq)]
pub enum PriceBasis {
    Tiered { classification: Classification, rule: PricingRule },
    Legacy { discounted: bool },
}

impl fmt::Display for PriceBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tiered { classification, rule } => write!(
                f,
                "demand={} stock={} age={} brand={} rule={}",
                classification.demand,
                classification.stock_level,
                classification.age,
                classification.brand_tier,
                rule
            ),
            Self::Legacy { discounted: true } => f.write_str("legacy discount"),
            Self::Legacy { discounted: false } => f.write_str("legacy best-seller"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PriceDecision {
    pub price: u64,
    pub basis: PriceBasis,
}

/// Prices one product with whichever strategy the config selects.
pub fn price_product(
    product: &Product,
    now: DateTime<Utc>,
    config: &PricingConfig,
    source: &mut dyn MultiplierSource,
) -> Result<PriceDecision, PricingError> {
    match config.strategy {
        PricingStrategy::Tiered => {
            let classification = classify(product, now, config);
            let rule = select_rule(&classification);
            let price =
                compute_price(product.base_price, &classification, &config.multipliers, source)?;
            Ok(PriceDecision { price, basis: PriceBasis::Tiered { classification, rule } })
        }
        PricingStrategy::Legacy => {
            let discounted = !config.legacy.keeps_base_price(product);
            let price = legacy_price(product, &config.legacy, source)?;
            Ok(PriceDecision { price, basis: PriceBasis::Legacy { discounted } })
        }
    }
}
