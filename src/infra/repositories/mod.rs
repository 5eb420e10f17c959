//! Repository layer - data access behind traits.

pub(crate) mod entities;
mod category_repository;
mod history_repository;
mod order_repository;
mod product_repository;
mod user_repository;

pub use category_repository::{CategoryRepository, CategoryStore};
pub use history_repository::{HistoryRepository, HistoryStore};
pub use order_repository::{OrderRepository, OrderStore};
pub use product_repository::{ProductRepository, ProductStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use category_repository::MockCategoryRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use history_repository::MockHistoryRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use order_repository::MockOrderRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use product_repository::MockProductRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
