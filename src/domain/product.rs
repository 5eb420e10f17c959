//! Product catalog entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog entry with its current stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock_number: i32,
    pub price: f64,
    pub low_stock_threshold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock_number: i32,
    pub price: f64,
    pub low_stock_threshold: i32,
}

/// Catalog edit. Stock is absent: it only moves through orders and
/// explicit stock overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub low_stock_threshold: Option<i32>,
}

/// Result of a stock mutation: the product as it was read and the value
/// that replaced its stock.
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub before: Product,
    pub new_stock: i32,
}

impl StockChange {
    pub fn old_stock(&self) -> i32 {
        self.before.stock_number
    }

    /// Signed difference; positive means stock came in.
    pub fn delta(&self) -> i32 {
        self.new_stock - self.before.stock_number
    }
}

/// Stock totals across the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockSummary {
    pub product_types: u64,
    pub total_units: i64,
    pub low_stock_types: u64,
}

impl StockSummary {
    /// Build from storage aggregates, which arrive as signed 64-bit counts.
    pub fn from_counts(product_types: i64, total_units: i64, low_stock_types: i64) -> Self {
        Self {
            product_types: u64::try_from(product_types).unwrap_or_default(),
            total_units,
            low_stock_types: u64::try_from(low_stock_types).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i32, threshold: i32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            category_id: None,
            description: None,
            image: None,
            stock_number: stock,
            price: 2.5,
            low_stock_threshold: threshold,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stock_summary_from_counts() {
        let summary = StockSummary::from_counts(4, 19, 3);
        assert_eq!(summary.product_types, 4);
        assert_eq!(summary.total_units, 19);
        assert_eq!(summary.low_stock_types, 3);

        assert_eq!(StockSummary::from_counts(-1, 0, -1), StockSummary::default());
    }

    #[test]
    fn test_stock_change_delta() {
        let change = StockChange {
            before: product(10, 0),
            new_stock: 4,
        };
        assert_eq!(change.old_stock(), 10);
        assert_eq!(change.delta(), -6);
    }
}
