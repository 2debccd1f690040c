use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog listing as seen by the pricing engine.
///
/// `base_price` belongs to the seller; the engine only ever writes
/// `current_price`, which is kept at or above 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub base_price: u64,
    pub current_price: u64,
    pub stock: u64,
    pub sales: u64,
    pub views: u64,
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// A freshly listed product: no sales, no views, selling at its base price.
    pub fn listed(
        id: impl Into<String>,
        name: impl Into<String>,
        base_price: u64,
        stock: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProductId(id.into()),
            name: name.into(),
            base_price,
            current_price: base_price.max(1),
            stock,
            sales: 0,
            views: 0,
            created_at: Some(created_at),
        }
    }
}

/// A computed price that differs from the stored `current_price`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub product_id: ProductId,
    pub product_name: String,
    pub previous_price: u64,
    pub new_price: u64,
}
