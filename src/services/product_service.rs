//! Catalog maintenance. Every mutation appends a history entry attributed
//! to the acting user.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::stock::update_stock_with;
use crate::domain::{
    HistoryAction, NewHistory, NewProduct, Product, ProductChanges, StockSnapshot, User,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductService: Send + Sync {
    async fn list_products(&self) -> AppResult<Vec<Product>>;

    async fn get_product(&self, id: Uuid) -> AppResult<Product>;

    async fn create_product(&self, actor: &User, product: NewProduct) -> AppResult<Product>;

    async fn update_product(
        &self,
        actor: &User,
        id: Uuid,
        changes: ProductChanges,
    ) -> AppResult<Product>;

    /// Manual stock override (replenishment or correction).
    async fn update_stock(&self, actor: &User, id: Uuid, new_stock: i32) -> AppResult<Product>;

    async fn delete_product(&self, actor: &User, id: Uuid) -> AppResult<()>;
}

pub struct ProductManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ProductManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn ensure_category(&self, category_id: Option<Uuid>) -> AppResult<()> {
        if let Some(id) = category_id {
            self.uow
                .categories()
                .find_by_id(id)
                .await?
                .ok_or_not_found("Category")?;
        }
        Ok(())
    }
}

fn validate_values(price: Option<f64>, threshold: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(AppError::validation("Price must be zero or positive"));
    }
    if threshold.is_some_and(|t| t < 0) {
        return Err(AppError::validation(
            "Low stock threshold must be zero or positive",
        ));
    }
    Ok(())
}

#[async_trait]
impl<U: UnitOfWork> ProductService for ProductManager<U> {
    async fn list_products(&self) -> AppResult<Vec<Product>> {
        self.uow.products().list().await
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        self.uow
            .products()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Product")
    }

    #[tracing::instrument(skip(self, actor, product), fields(actor = %actor.id, name = %product.name))]
    async fn create_product(&self, actor: &User, product: NewProduct) -> AppResult<Product> {
        validate_values(Some(product.price), Some(product.low_stock_threshold))?;
        if product.stock_number < 0 {
            return Err(AppError::validation("Stock must be zero or positive"));
        }
        self.ensure_category(product.category_id).await?;

        let created = self.uow.products().create(product).await?;
        self.uow
            .histories()
            .append(
                NewHistory::new(HistoryAction::New, &created, actor)
                    .new_value(StockSnapshot::of(&created)),
            )
            .await?;

        tracing::info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    async fn update_product(
        &self,
        actor: &User,
        id: Uuid,
        changes: ProductChanges,
    ) -> AppResult<Product> {
        validate_values(changes.price, changes.low_stock_threshold)?;
        self.ensure_category(changes.category_id).await?;

        let before = self.get_product(id).await?;
        let updated = self.uow.products().update(id, changes).await?;

        self.uow
            .histories()
            .append(
                NewHistory::new(HistoryAction::Update, &updated, actor)
                    .old_value(StockSnapshot::of(&before))
                    .new_value(StockSnapshot::of(&updated)),
            )
            .await?;

        Ok(updated)
    }

    #[tracing::instrument(skip(self, actor), fields(actor = %actor.id))]
    async fn update_stock(&self, actor: &User, id: Uuid, new_stock: i32) -> AppResult<Product> {
        if new_stock < 0 {
            return Err(AppError::bad_request("Stock cannot be negative"));
        }

        let change = update_stock_with(&*self.uow.products(), id, |_| Ok(new_stock)).await?;
        let product = Product {
            stock_number: change.new_stock,
            ..change.before.clone()
        };

        self.uow
            .histories()
            .append(
                NewHistory::new(HistoryAction::Update, &product, actor)
                    .old_value(StockSnapshot::stock(change.old_stock()))
                    .new_value(StockSnapshot::stock(change.new_stock))
                    .quantity(change.delta()),
            )
            .await?;

        tracing::info!(
            product_id = %id,
            old = change.old_stock(),
            new = change.new_stock,
            "Stock overridden"
        );
        Ok(product)
    }

    async fn delete_product(&self, actor: &User, id: Uuid) -> AppResult<()> {
        let product = self.get_product(id).await?;

        self.uow
            .histories()
            .append(
                NewHistory::new(HistoryAction::Delete, &product, actor)
                    .old_value(StockSnapshot::of(&product)),
            )
            .await?;

        if !self.uow.products().delete(id).await? {
            return Err(AppError::not_found("Product"));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::test_utils::{echo_history, test_product, test_user, MockRepositories};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_update_stock_records_signed_quantity() {
        let product = test_product("Tea", 10, 2);
        let id = product.id;
        let admin = test_user(UserRole::Admin);

        let mut repos = MockRepositories::default();
        repos
            .products
            .expect_find_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repos
            .products
            .expect_compare_and_set_stock()
            .with(eq(id), eq(10), eq(4))
            .times(1)
            .returning(|_, _, _| Ok(true));
        repos
            .histories
            .expect_append()
            .withf(|entry| {
                entry.action_type == HistoryAction::Update
                    && entry.details.quantity == Some(-6)
                    && entry.details.old_value == Some(StockSnapshot::stock(10))
                    && entry.details.new_value == Some(StockSnapshot::stock(4))
            })
            .times(1)
            .returning(echo_history);

        let service = ProductManager::new(repos.into_unit_of_work());
        let updated = service.update_stock(&admin, id, 4).await.unwrap();
        assert_eq!(updated.stock_number, 4);
    }

    #[tokio::test]
    async fn test_update_stock_rejects_negative() {
        let service = ProductManager::new(MockRepositories::default().into_unit_of_work());
        let err = service
            .update_stock(&test_user(UserRole::Admin), Uuid::new_v4(), -1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_product_writes_new_history() {
        let admin = test_user(UserRole::Admin);
        let admin_name = admin.name.clone();

        let mut repos = MockRepositories::default();
        repos.products.expect_create().returning(|new_product| {
            let mut product = test_product(&new_product.name, new_product.stock_number, 1);
            product.price = new_product.price;
            Ok(product)
        });
        repos
            .histories
            .expect_append()
            .withf(move |entry| {
                entry.action_type == HistoryAction::New
                    && entry.user_name == admin_name
                    && entry.details.new_value
                        == Some(StockSnapshot {
                            stock_level: Some(12),
                            price: Some(3.5),
                        })
            })
            .times(1)
            .returning(echo_history);

        let service = ProductManager::new(repos.into_unit_of_work());
        service
            .create_product(
                &admin,
                NewProduct {
                    name: "Cocoa".into(),
                    category_id: None,
                    description: None,
                    image: None,
                    stock_number: 12,
                    price: 3.5,
                    low_stock_threshold: 1,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_snapshots_before_removing() {
        let product = test_product("Tea", 3, 1);
        let id = product.id;

        let mut seq = mockall::Sequence::new();
        let mut repos = MockRepositories::default();
        repos
            .products
            .expect_find_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repos
            .histories
            .expect_append()
            .withf(|entry| {
                entry.action_type == HistoryAction::Delete
                    && entry.details.old_value.and_then(|v| v.stock_level) == Some(3)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(echo_history);
        repos
            .products
            .expect_delete()
            .with(eq(id))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        let service = ProductManager::new(repos.into_unit_of_work());
        service
            .delete_product(&test_user(UserRole::Admin), id)
            .await
            .unwrap();
    }
}
