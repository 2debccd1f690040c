use chrono::{DateTime, Duration, Utc};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// One listing of the demo catalog. `age_days = None` leaves `created_at`
/// empty, which the classifier treats as a new listing.
struct SeedProduct {
    id: &'static str,
    name: &'static str,
    base_price: i64,
    stock: i64,
    sales: i64,
    views: i64,
    age_days: Option<i64>,
}

/// Covers every row of the pricing table at least once.
const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        id: "demo-scarce-headphones",
        name: "Studio Headphones",
        base_price: 1000,
        stock: 3,
        sales: 10,
        views: 80,
        age_days: Some(0),
    },
    SeedProduct {
        id: "demo-popular-kettle",
        name: "Steel Kettle",
        base_price: 1800,
        stock: 120,
        sales: 30,
        views: 400,
        age_days: Some(40),
    },
    SeedProduct {
        id: "demo-new-backpack",
        name: "Trail Backpack",
        base_price: 2400,
        stock: 60,
        sales: 0,
        views: 4,
        age_days: Some(1),
    },
    SeedProduct {
        id: "demo-undated-mug",
        name: "Ceramic Mug",
        base_price: 300,
        stock: 25,
        sales: 0,
        views: 0,
        age_days: None,
    },
    SeedProduct {
        id: "demo-premium-lowstock",
        name: "Samsung Monitor",
        base_price: 15000,
        stock: 4,
        sales: 1,
        views: 10,
        age_days: Some(30),
    },
    SeedProduct {
        id: "demo-standard-lowstock",
        name: "Generic Cable",
        base_price: 500,
        stock: 2,
        sales: 0,
        views: 0,
        age_days: Some(10),
    },
    SeedProduct {
        id: "demo-premium-clearance",
        name: "Nike Runner",
        base_price: 2000,
        stock: 50,
        sales: 0,
        views: 0,
        age_days: Some(10),
    },
    SeedProduct {
        id: "demo-standard-clearance",
        name: "Desk Lamp",
        base_price: 800,
        stock: 0,
        sales: 2,
        views: 12,
        age_days: Some(90),
    },
];

/// Deterministic catalog for local runs of the pricing loop.
pub struct DemoCatalog;

impl DemoCatalog {
    /// Inserts the demo listings at their base price. Re-seeding resets them.
    pub async fn load(pool: &DbPool, now: DateTime<Utc>) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        for product in SEED_PRODUCTS {
            let created_at =
                product.age_days.map(|days| (now - Duration::days(days)).to_rfc3339());
            sqlx::query(
                "INSERT INTO product (id, name, base_price, current_price, stock, sales, views,
                                      created_at)
                 VALUES (?1, ?2, ?3, MAX(?3, 1), ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     base_price = excluded.base_price,
                     current_price = excluded.current_price,
                     stock = excluded.stock,
                     sales = excluded.sales,
                     views = excluded.views,
                     created_at = excluded.created_at",
            )
            .bind(product.id)
            .bind(product.name)
            .bind(product.base_price)
            .bind(product.stock)
            .bind(product.sales)
            .bind(product.views)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult { products_seeded: SEED_PRODUCTS.iter().map(|product| product.id).collect() })
    }

    /// Checks every demo listing is present with its seeded base price.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_PRODUCTS.len());

        for product in SEED_PRODUCTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product WHERE id = ?1 AND base_price = ?2)",
            )
            .bind(product.id)
            .bind(product.base_price)
            .fetch_one(pool)
            .await?;
            checks.push((product.id, present == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub products_seeded: Vec<&'static str>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
