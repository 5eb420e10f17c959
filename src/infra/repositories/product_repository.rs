//! Product persistence, including the conditional stock write.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::product::{self, ActiveModel, Entity as ProductEntity};
use crate::domain::{NewProduct, Product, ProductChanges, StockSummary};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn list(&self) -> AppResult<Vec<Product>>;

    /// Catalog totals computed by the database. Low stock means at or below
    /// the product's threshold.
    async fn stock_summary(&self) -> AppResult<StockSummary>;

    async fn create(&self, product: NewProduct) -> AppResult<Product>;

    async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product>;

    /// Write `new` only if the stored stock still equals `expected`.
    /// Returns whether the write happened.
    async fn compare_and_set_stock(&self, id: Uuid, expected: i32, new: i32) -> AppResult<bool>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

pub struct ProductStore {
    db: DatabaseConnection,
}

impl ProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let result = ProductEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Product::from))
    }

    async fn list(&self) -> AppResult<Vec<Product>> {
        let models = ProductEntity::find()
            .order_by_asc(product::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Product::from).collect())
    }

    async fn stock_summary(&self) -> AppResult<StockSummary> {
        let totals: Option<(i64, i64, i64)> = ProductEntity::find()
            .select_only()
            .column_as(Expr::col(product::Column::Id).count(), "product_types")
            .column_as(Expr::cust("COALESCE(SUM(stock_number), 0)"), "total_units")
            .column_as(
                Expr::cust("COUNT(*) FILTER (WHERE stock_number <= low_stock_threshold)"),
                "low_stock_types",
            )
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(totals
            .map(|(types, units, low)| StockSummary::from_counts(types, units, low))
            .unwrap_or_default())
    }

    async fn create(&self, new_product: NewProduct) -> AppResult<Product> {
        let now = chrono::Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_product.name),
            category_id: Set(new_product.category_id),
            description: Set(new_product.description),
            image: Set(new_product.image),
            stock_number: Set(new_product.stock_number),
            price: Set(new_product.price),
            low_stock_threshold: Set(new_product.low_stock_threshold),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(AppError::from)?;

        Ok(Product::from(model))
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product> {
        let existing = ProductEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Product")?;

        let mut active: ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(Some(category_id));
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(image) = changes.image {
            active.image = Set(Some(image));
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(threshold) = changes.low_stock_threshold {
            active.low_stock_threshold = Set(threshold);
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(&self.db).await.map_err(AppError::from)?;
        Ok(Product::from(model))
    }

    async fn compare_and_set_stock(&self, id: Uuid, expected: i32, new: i32) -> AppResult<bool> {
        let result = ProductEntity::update_many()
            .col_expr(product::Column::StockNumber, Expr::value(new))
            .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::StockNumber.eq(expected))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected == 1)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = ProductEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected > 0)
    }
}
