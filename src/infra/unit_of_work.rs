//! Unit of Work: one place that hands out every repository.
//!
//! Services depend on this trait rather than on individual stores, so a
//! single in-memory or mocked implementation can stand in for the whole
//! persistence layer in tests.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use super::repositories::{
    CategoryRepository, CategoryStore, HistoryRepository, HistoryStore, OrderRepository,
    OrderStore, ProductRepository, ProductStore, UserRepository, UserStore,
};

pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn categories(&self) -> Arc<dyn CategoryRepository>;

    fn products(&self) -> Arc<dyn ProductRepository>;

    fn orders(&self) -> Arc<dyn OrderRepository>;

    fn histories(&self) -> Arc<dyn HistoryRepository>;
}

/// Database-backed UnitOfWork.
pub struct Persistence {
    users: Arc<UserStore>,
    categories: Arc<CategoryStore>,
    products: Arc<ProductStore>,
    orders: Arc<OrderStore>,
    histories: Arc<HistoryStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            categories: Arc::new(CategoryStore::new(db.clone())),
            products: Arc::new(ProductStore::new(db.clone())),
            orders: Arc::new(OrderStore::new(db.clone())),
            histories: Arc::new(HistoryStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn categories(&self) -> Arc<dyn CategoryRepository> {
        self.categories.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.products.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.orders.clone()
    }

    fn histories(&self) -> Arc<dyn HistoryRepository> {
        self.histories.clone()
    }
}
