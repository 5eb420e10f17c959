//! Application services layer.
//!
//! Services hold the business rules and reach storage only through the
//! [`UnitOfWork`](crate::infra::UnitOfWork) abstraction, so every one of
//! them can be exercised against mocked repositories.

mod auth_service;
mod category_service;
pub mod container;
mod dashboard_service;
mod history_service;
mod order_service;
mod product_service;
mod stock;
mod user_service;

pub use container::{ServiceContainer, Services};

pub use auth_service::{
    normalize_email, AuthService, AuthSession, Authenticator, Claims, Registration, TokenResponse,
};
pub use category_service::{CategoryManager, CategoryService};
pub use dashboard_service::{DashboardAggregator, DashboardService};
pub use history_service::{HistoryReader, HistoryService};
pub use order_service::{OrderManager, OrderService, PlaceOrder};
pub use product_service::{ProductManager, ProductService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use category_service::MockCategoryService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use dashboard_service::MockDashboardService;
#[cfg(any(test, feature = "test-utils"))]
pub use history_service::MockHistoryService;
#[cfg(any(test, feature = "test-utils"))]
pub use order_service::MockOrderService;
#[cfg(any(test, feature = "test-utils"))]
pub use product_service::MockProductService;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;
