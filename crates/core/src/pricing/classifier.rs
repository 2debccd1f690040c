use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;
use crate::domain::product::Product;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    High,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Low,
    Normal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    New,
    Mature,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandTier {
    Premium,
    Standard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub demand: DemandLevel,
    pub stock_level: StockLevel,
    pub age: AgeBucket,
    pub brand_tier: BrandTier,
}

/// Derives the discrete pricing signals for one product.
///
/// - demand is high when sales or views exceed their thresholds (strictly);
/// - stock is low only for `0 < stock < low_stock_threshold`, so a sold-out
///   listing counts as normal stock;
/// - a product without `created_at`, or created in the future, is new.
pub fn classify(product: &Product, now: DateTime<Utc>, config: &PricingConfig) -> Classification {
    let demand = if product.sales > config.demand_sales_threshold
        || product.views > config.demand_views_threshold
    {
        DemandLevel::High
    } else {
        DemandLevel::Low
    };

    let stock_level = if product.stock > 0 && product.stock < config.low_stock_threshold {
        StockLevel::Low
    } else {
        StockLevel::Normal
    };

    let age = match product.created_at {
        Some(created_at) if now - created_at >= config.new_product_window() => AgeBucket::Mature,
        _ => AgeBucket::New,
    };

    let brand_tier = if is_premium(&product.name, &config.premium_brands) {
        BrandTier::Premium
    } else {
        BrandTier::Standard
    };

    Classification { demand, stock_level, age, brand_tier }
}

fn is_premium(name: &str, brands: &[String]) -> bool {
    let name = name.to_lowercase();
    brands
        .iter()
        .map(|brand| brand.trim())
        .filter(|brand| !brand.is_empty())
        .any(|brand| name.contains(&brand.to_lowercase()))
}

impl fmt::Display for DemandLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Low => "low",
        })
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Normal => "normal",
        })
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::New => "new",
            Self::Mature => "mature",
        })
    }
}

impl fmt::Display for BrandTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Premium => "premium",
            Self::Standard => "standard",
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{classify, AgeBucket, BrandTier, DemandLevel, StockLevel};
    use crate::config::PricingConfig;
    use crate::domain::product::Product;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 9, 30, 0).unwrap()
    }

    fn product(name: &str, sales: u64, views: u64, stock: u64, age_days: i64) -> Product {
        let mut product = Product::listed("p", name, 1000, stock, now() - Duration::days(age_days));
        product.sales = sales;
        product.views = views;
        product
    }

    #[test]
    fn demand_thresholds_are_strict() {
        let config = PricingConfig::default();

        assert_eq!(classify(&product("x", 5, 50, 20, 10), now(), &config).demand, DemandLevel::Low);
        assert_eq!(classify(&product("x", 6, 0, 20, 10), now(), &config).demand, DemandLevel::High);
        assert_eq!(classify(&product("x", 0, 51, 20, 10), now(), &config).demand, DemandLevel::High);
    }

    #[test]
    fn stock_is_low_only_between_zero_and_threshold() {
        let config = PricingConfig::default();

        assert_eq!(classify(&product("x", 0, 0, 1, 10), now(), &config).stock_level, StockLevel::Low);
        assert_eq!(classify(&product("x", 0, 0, 9, 10), now(), &config).stock_level, StockLevel::Low);
        assert_eq!(
            classify(&product("x", 0, 0, 10, 10), now(), &config).stock_level,
            StockLevel::Normal
        );
    }

    #[test]
    fn sold_out_listing_is_normal_stock() {
        let config = PricingConfig::default();

        let classification = classify(&product("x", 0, 0, 0, 10), now(), &config);

        assert_eq!(classification.stock_level, StockLevel::Normal);
    }

    #[test]
    fn age_window_boundary_is_mature() {
        let config = PricingConfig::default();
        let mut listing = product("x", 0, 0, 20, 0);

        listing.created_at = Some(now() - Duration::hours(72));
        assert_eq!(classify(&listing, now(), &config).age, AgeBucket::Mature);

        listing.created_at = Some(now() - Duration::hours(72) + Duration::seconds(1));
        assert_eq!(classify(&listing, now(), &config).age, AgeBucket::New);
    }

    #[test]
    fn missing_or_future_created_at_is_new() {
        let config = PricingConfig::default();
        let mut listing = product("x", 0, 0, 20, 0);

        listing.created_at = None;
        assert_eq!(classify(&listing, now(), &config).age, AgeBucket::New);

        listing.created_at = Some(now() + Duration::days(2));
        assert_eq!(classify(&listing, now(), &config).age, AgeBucket::New);
    }

    #[test]
    fn brand_match_is_case_insensitive_substring() {
        let config = PricingConfig::default();

        assert_eq!(
            classify(&product("NIKE Air Runner", 0, 0, 20, 10), now(), &config).brand_tier,
            BrandTier::Premium
        );
        assert_eq!(
            classify(&product("Generic Cable", 0, 0, 20, 10), now(), &config).brand_tier,
            BrandTier::Standard
        );
    }

    #[test]
    fn custom_brand_list_replaces_defaults() {
        let config = PricingConfig {
            premium_brands: vec!["Acme".to_string(), "  ".to_string()],
            ..PricingConfig::default()
        };

        assert_eq!(
            classify(&product("acme anvil", 0, 0, 20, 10), now(), &config).brand_tier,
            BrandTier::Premium
        );
        assert_eq!(
            classify(&product("Nike Runner", 0, 0, 20, 10), now(), &config).brand_tier,
            BrandTier::Standard
        );
    }

    #[test]
    fn classification_is_deterministic_for_same_instant() {
        let config = PricingConfig::default();
        let listing = product("Sony Headphones", 3, 70, 4, 1);

        assert_eq!(classify(&listing, now(), &config), classify(&listing, now(), &config));
    }

    #[test]
    fn scenario_b_premium_mature_clearance() {
        let config = PricingConfig::default();
        let mut listing = product("Nike Runner", 0, 0, 50, 10);
        listing.base_price = 2000;

        let classification = classify(&listing, now(), &config);

        assert_eq!(classification.demand, DemandLevel::Low);
        assert_eq!(classification.stock_level, StockLevel::Normal);
        assert_eq!(classification.age, AgeBucket::Mature);
        assert_eq!(classification.brand_tier, BrandTier::Premium);
    }
}
