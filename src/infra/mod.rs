//! Infrastructure layer - database, repositories and the optional Redis cache.

pub mod cache;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use repositories::{
    CategoryRepository, CategoryStore, HistoryRepository, HistoryStore, OrderRepository,
    OrderStore, ProductRepository, ProductStore, UserRepository, UserStore,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockCategoryRepository, MockHistoryRepository, MockOrderRepository, MockProductRepository,
    MockUserRepository,
};
