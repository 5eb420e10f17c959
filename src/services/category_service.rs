use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Category, CategoryChanges};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    async fn create_category(&self, name: String, description: Option<String>)
        -> AppResult<Category>;

    async fn update_category(&self, id: Uuid, changes: CategoryChanges) -> AppResult<Category>;

    async fn delete_category(&self, id: Uuid) -> AppResult<()>;
}

pub struct CategoryManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> CategoryManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> CategoryService for CategoryManager<U> {
    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.uow.categories().list().await
    }

    async fn create_category(
        &self,
        name: String,
        description: Option<String>,
    ) -> AppResult<Category> {
        let category = self
            .uow
            .categories()
            .create(name.trim().to_string(), description)
            .await?;
        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, mut changes: CategoryChanges) -> AppResult<Category> {
        changes.name = changes.name.map(|name| name.trim().to_string());
        self.uow.categories().update(id, changes).await
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<()> {
        if !self.uow.categories().delete(id).await? {
            return Err(AppError::not_found("Category"));
        }
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
