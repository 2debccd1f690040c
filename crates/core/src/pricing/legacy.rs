use serde::{Deserialize, Serialize};

use super::calculator::apply_multiplier;
use super::multiplier::{MultiplierRange, MultiplierSource};
use crate::domain::product::Product;
use crate::errors::PricingError;

/// The original two-branch rule: best-sellers keep their base price, everything
/// else is discounted into `discount`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyRule {
    pub sales_threshold: u64,
    pub discount: MultiplierRange,
}

impl Default for LegacyRule {
    fn default() -> Self {
        Self { sales_threshold: 10, discount: MultiplierRange::new(0.30, 0.60) }
    }
}

impl LegacyRule {
    pub fn keeps_base_price(&self, product: &Product) -> bool {
        product.sales > self.sales_threshold
    }
}

pub fn legacy_price(
    product: &Product,
    rule: &LegacyRule,
    source: &mut dyn MultiplierSource,
) -> Result<u64, PricingError> {
    if rule.keeps_base_price(product) {
        return Ok(product.base_price.max(1));
    }
    apply_multiplier(product.base_price, rule.discount, source)
}
