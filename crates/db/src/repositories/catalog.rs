use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use dynaprice_core::domain::product::{PriceChange, Product, ProductId};
use dynaprice_core::engine::{CatalogSnapshot, CatalogStore};
use dynaprice_core::errors::CatalogError;

use crate::DbPool;

/// Three binds per row keeps each statement well under SQLite's variable cap.
const UPDATE_CHUNK_SIZE: usize = 200;

pub struct SqlCatalogStore {
    pool: DbPool,
}

impl SqlCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_counter(row: &SqliteRow, column: &str) -> Result<u64, String> {
    let value: i64 = row.try_get(column).map_err(|e| format!("{column}: {e}"))?;
    u64::try_from(value).map_err(|_| format!("{column} `{value}` is negative"))
}

fn decode_created_at(raw: Option<String>) -> Result<Option<DateTime<Utc>>, String> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| format!("created_at `{raw}` is not a timestamp"))
}

fn row_to_product(row: &SqliteRow) -> Result<Product, CatalogError> {
    let id: String = row.try_get("id").map_err(|e| CatalogError::Malformed {
        product_id: ProductId("<unreadable>".to_string()),
        reason: e.to_string(),
    })?;
    let malformed =
        |reason: String| CatalogError::Malformed { product_id: ProductId(id.clone()), reason };

    let name: String = row.try_get("name").map_err(|e| malformed(format!("name: {e}")))?;
    let created_at: Option<String> =
        row.try_get("created_at").map_err(|e| malformed(format!("created_at: {e}")))?;

    Ok(Product {
        name,
        base_price: decode_counter(row, "base_price").map_err(malformed)?,
        current_price: decode_counter(row, "current_price").map_err(malformed)?,
        stock: decode_counter(row, "stock").map_err(malformed)?,
        sales: decode_counter(row, "sales").map_err(malformed)?,
        views: decode_counter(row, "views").map_err(malformed)?,
        created_at: decode_created_at(created_at).map_err(malformed)?,
        id: ProductId(id),
    })
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn load_catalog(&self) -> Result<CatalogSnapshot, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, name, base_price, current_price, stock, sales, views, created_at
             FROM product ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let mut snapshot = CatalogSnapshot::default();
        for row in &rows {
            match row_to_product(row) {
                Ok(product) => snapshot.products.push(product),
                Err(rejected) => snapshot.rejected.push(rejected),
            }
        }
        Ok(snapshot)
    }

    async fn apply_price_updates(&self, changes: &[PriceChange]) -> Result<u64, CatalogError> {
        let write_failed = |e: sqlx::Error| CatalogError::WriteFailed(e.to_string());
        let mut tx = self.pool.begin().await.map_err(write_failed)?;
        let mut updated = 0;

        for chunk in changes.chunks(UPDATE_CHUNK_SIZE) {
            let mut builder =
                QueryBuilder::<Sqlite>::new("UPDATE product SET current_price = CASE id");
            for change in chunk {
                let price = i64::try_from(change.new_price.max(1)).map_err(|_| {
                    CatalogError::WriteFailed(format!(
                        "price {} for `{}` exceeds the storable range",
                        change.new_price, change.product_id
                    ))
                })?;
                builder.push(" WHEN ").push_bind(change.product_id.0.clone());
                builder.push(" THEN ").push_bind(price);
            }
            builder.push(
                " ELSE current_price END, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id IN (",
            );
            let mut ids = builder.separated(", ");
            for change in chunk {
                ids.push_bind(change.product_id.0.clone());
            }
            ids.push_unseparated(")");

            let result = builder.build().execute(&mut *tx).await.map_err(write_failed)?;
            updated += result.rows_affected();
        }

        tx.commit().await.map_err(write_failed)?;
        debug!(requested = changes.len(), updated, "bulk current_price update committed");
        Ok(updated)
    }
}
