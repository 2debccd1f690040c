use std::fmt;

use serde::{Deserialize, Serialize};

use super::classifier::{AgeBucket, BrandTier, Classification, DemandLevel, StockLevel};
use super::multiplier::{MultiplierRange, MultiplierSource};
use crate::errors::PricingError;

/// Row of the pricing decision table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingRule {
    /// High demand, scarce stock.
    Scarcity,
    HighDemand,
    /// Low demand, recently listed: hold near the seller's price.
    NewListing,
    PremiumLowStock,
    StandardLowStock,
    PremiumClearance,
    StandardClearance,
}

impl PricingRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scarcity => "scarcity",
            Self::HighDemand => "high_demand",
            Self::NewListing => "new_listing",
            Self::PremiumLowStock => "premium_low_stock",
            Self::StandardLowStock => "standard_low_stock",
            Self::PremiumClearance => "premium_clearance",
            Self::StandardClearance => "standard_clearance",
        }
    }
}

impl fmt::Display for PricingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub scarcity: MultiplierRange,
    pub high_demand: MultiplierRange,
    pub new_listing: MultiplierRange,
    pub premium_low_stock: MultiplierRange,
    pub standard_low_stock: MultiplierRange,
    pub premium_clearance: MultiplierRange,
    pub standard_clearance: MultiplierRange,
}

impl Default for MultiplierTable {
    fn default() -> Self {
        Self {
            scarcity: MultiplierRange::new(1.00, 1.10),
            high_demand: MultiplierRange::new(0.90, 1.00),
            new_listing: MultiplierRange::new(0.95, 1.05),
            premium_low_stock: MultiplierRange::new(0.60, 0.70),
            standard_low_stock: MultiplierRange::new(0.20, 0.30),
            premium_clearance: MultiplierRange::new(0.70, 0.80),
            standard_clearance: MultiplierRange::new(0.40, 0.50),
        }
    }
}

impl MultiplierTable {
    pub fn range(&self, rule: PricingRule) -> MultiplierRange {
        match rule {
            PricingRule::Scarcity => self.scarcity,
            PricingRule::HighDemand => self.high_demand,
            PricingRule::NewListing => self.new_listing,
            PricingRule::PremiumLowStock => self.premium_low_stock,
            PricingRule::StandardLowStock => self.standard_low_stock,
            PricingRule::PremiumClearance => self.premium_clearance,
            PricingRule::StandardClearance => self.standard_clearance,
        }
    }

    pub fn entries(&self) -> [(PricingRule, MultiplierRange); 7] {
        [
            PricingRule::Scarcity,
            PricingRule::HighDemand,
            PricingRule::NewListing,
            PricingRule::PremiumLowStock,
            PricingRule::StandardLowStock,
            PricingRule::PremiumClearance,
            PricingRule::StandardClearance,
        ]
        .map(|rule| (rule, self.range(rule)))
    }
}

pub fn select_rule(classification: &Classification) -> PricingRule {
    match (
        classification.demand,
        classification.stock_level,
        classification.age,
        classification.brand_tier,
    ) {
        (DemandLevel::High, StockLevel::Low, _, _) => PricingRule::Scarcity,
        (DemandLevel::High, StockLevel::Normal, _, _) => PricingRule::HighDemand,
        (DemandLevel::Low, _, AgeBucket::New, _) => PricingRule::NewListing,
        (DemandLevel::Low, StockLevel::Low, AgeBucket::Mature, BrandTier::Premium) => {
            PricingRule::PremiumLowStock
        }
        (DemandLevel::Low, StockLevel::Low, AgeBucket::Mature, BrandTier::Standard) => {
            PricingRule::StandardLowStock
        }
        (DemandLevel::Low, StockLevel::Normal, AgeBucket::Mature, BrandTier::Premium) => {
            PricingRule::PremiumClearance
        }
        (DemandLevel::Low, StockLevel::Normal, AgeBucket::Mature, BrandTier::Standard) => {
            PricingRule::StandardClearance
        }
    }
}

/// New selling price: `round(base_price * m)` for `m` drawn from the selected
/// range, floored at 1.
pub fn compute_price(
    base_price: u64,
    classification: &Classification,
    table: &MultiplierTable,
    source: &mut dyn MultiplierSource,
) -> Result<u64, PricingError> {
    let range = table.range(select_rule(classification));
    apply_multiplier(base_price, range, source)
}

pub(crate) fn apply_multiplier(
    base_price: u64,
    range: MultiplierRange,
    source: &mut dyn MultiplierSource,
) -> Result<u64, PricingError> {
    let multiplier = source.draw(range);
    if !range.contains(multiplier) {
        return Err(PricingError::MultiplierOutOfRange {
            multiplier,
            min: range.min,
            max: range.max,
        });
    }

    let rounded = (base_price as f64 * multiplier).round();
    if rounded >= u64::MAX as f64 {
        return Err(PricingError::PriceOverflow { base_price, multiplier });
    }

    Ok((rounded as u64).max(1))
}

#[cfg(test)]
mod tests {
    use super::{compute_price, select_rule, MultiplierTable, PricingRule};
    use crate::errors::PricingError;
    use crate::pricing::classifier::{
        AgeBucket, BrandTier, Classification, DemandLevel, StockLevel,
    };
    use crate::pricing::multiplier::{
        MultiplierRange, MultiplierSource, PinnedMultiplier, RandomMultiplier,
    };

    const DEMANDS: [DemandLevel; 2] = [DemandLevel::High, DemandLevel::Low];
    const STOCKS: [StockLevel; 2] = [StockLevel::Low, StockLevel::Normal];
    const AGES: [AgeBucket; 2] = [AgeBucket::New, AgeBucket::Mature];
    const BRANDS: [BrandTier; 2] = [BrandTier::Premium, BrandTier::Standard];

    fn classification(
        demand: DemandLevel,
        stock_level: StockLevel,
        age: AgeBucket,
        brand_tier: BrandTier,
    ) -> Classification {
        Classification { demand, stock_level, age, brand_tier }
    }

    fn all_classifications() -> Vec<Classification> {
        let mut out = Vec::new();
        for demand in DEMANDS {
            for stock in STOCKS {
                for age in AGES {
                    for brand in BRANDS {
                        out.push(classification(demand, stock, age, brand));
                    }
                }
            }
        }
        out
    }

    fn price_bounds(base_price: u64, range: MultiplierRange) -> (u64, u64) {
        let lo = ((base_price as f64 * range.min).round() as u64).max(1);
        let hi = ((base_price as f64 * range.max).round() as u64).max(1);
        (lo, hi)
    }

    struct Fixed(f64);

    impl MultiplierSource for Fixed {
        fn draw(&mut self, _range: MultiplierRange) -> f64 {
            self.0
        }
    }

    #[test]
    fn high_demand_ignores_age_and_brand() {
        for age in AGES {
            for brand in BRANDS {
                assert_eq!(
                    select_rule(&classification(DemandLevel::High, StockLevel::Low, age, brand)),
                    PricingRule::Scarcity
                );
                assert_eq!(
                    select_rule(&classification(DemandLevel::High, StockLevel::Normal, age, brand)),
                    PricingRule::HighDemand
                );
            }
        }
    }

    #[test]
    fn low_demand_new_listing_ignores_stock_and_brand() {
        for stock in STOCKS {
            for brand in BRANDS {
                assert_eq!(
                    select_rule(&classification(DemandLevel::Low, stock, AgeBucket::New, brand)),
                    PricingRule::NewListing
                );
            }
        }
    }

    #[test]
    fn mature_low_demand_splits_on_stock_and_brand() {
        let mature = |stock, brand| classification(DemandLevel::Low, stock, AgeBucket::Mature, brand);

        assert_eq!(
            select_rule(&mature(StockLevel::Low, BrandTier::Premium)),
            PricingRule::PremiumLowStock
        );
        assert_eq!(
            select_rule(&mature(StockLevel::Low, BrandTier::Standard)),
            PricingRule::StandardLowStock
        );
        assert_eq!(
            select_rule(&mature(StockLevel::Normal, BrandTier::Premium)),
            PricingRule::PremiumClearance
        );
        assert_eq!(
            select_rule(&mature(StockLevel::Normal, BrandTier::Standard)),
            PricingRule::StandardClearance
        );
    }

    #[test]
    fn random_prices_stay_inside_selected_bounds() {
        let table = MultiplierTable::default();
        let mut source = RandomMultiplier::seeded(2026);

        for classification in all_classifications() {
            let range = table.range(select_rule(&classification));
            for base_price in [1_u64, 7, 499, 1000, 2000, 123_457] {
                let (lo, hi) = price_bounds(base_price, range);
                for _ in 0..25 {
                    let price =
                        compute_price(base_price, &classification, &table, &mut source).unwrap();
                    assert!(
                        (lo..=hi).contains(&price),
                        "{price} outside [{lo}, {hi}] for {classification:?} base {base_price}"
                    );
                    assert!(price >= 1);
                }
            }
        }
    }

    #[test]
    fn price_floor_applies_to_zero_and_tiny_base_prices() {
        let table = MultiplierTable::default();
        let mut source = PinnedMultiplier::Lower;

        for classification in all_classifications() {
            assert_eq!(compute_price(0, &classification, &table, &mut source).unwrap(), 1);
            assert_eq!(compute_price(1, &classification, &table, &mut source).unwrap(), 1);
        }
    }

    #[test]
    fn pinned_draw_gives_exact_prices() {
        let table = MultiplierTable::default();
        let scarce =
            classification(DemandLevel::High, StockLevel::Low, AgeBucket::New, BrandTier::Standard);

        assert_eq!(
            compute_price(1000, &scarce, &table, &mut PinnedMultiplier::Lower).unwrap(),
            1000
        );
        assert_eq!(
            compute_price(1000, &scarce, &table, &mut PinnedMultiplier::Upper).unwrap(),
            1100
        );
        assert_eq!(
            compute_price(1000, &scarce, &table, &mut PinnedMultiplier::Fraction(0.5)).unwrap(),
            1050
        );
    }

    #[test]
    fn source_escaping_the_range_is_a_pricing_error() {
        let table = MultiplierTable::default();
        let clearance = classification(
            DemandLevel::Low,
            StockLevel::Normal,
            AgeBucket::Mature,
            BrandTier::Standard,
        );

        let error = compute_price(100, &clearance, &table, &mut Fixed(0.9)).unwrap_err();
        assert_eq!(error, PricingError::MultiplierOutOfRange { multiplier: 0.9, min: 0.4, max: 0.5 });

        let error = compute_price(100, &clearance, &table, &mut Fixed(f64::NAN)).unwrap_err();
        assert!(matches!(error, PricingError::MultiplierOutOfRange { .. }));
    }

    #[test]
    fn oversized_result_is_reported_as_overflow() {
        let table = MultiplierTable::default();
        let scarce =
            classification(DemandLevel::High, StockLevel::Low, AgeBucket::New, BrandTier::Standard);

        let error =
            compute_price(u64::MAX, &scarce, &table, &mut PinnedMultiplier::Upper).unwrap_err();

        assert!(matches!(error, PricingError::PriceOverflow { .. }));
    }

    #[test]
    fn custom_table_row_is_honoured() {
        let table = MultiplierTable {
            standard_clearance: MultiplierRange::new(0.10, 0.10),
            ..MultiplierTable::default()
        };
        let clearance = classification(
            DemandLevel::Low,
            StockLevel::Normal,
            AgeBucket::Mature,
            BrandTier::Standard,
        );

        assert_eq!(
            compute_price(990, &clearance, &table, &mut RandomMultiplier::seeded(1)).unwrap(),
            99
        );
    }
}
