//! Service container: one place to reach every application service.
//!
//! Handlers and the realtime hub depend on [`ServiceContainer`] rather than
//! on concrete services, so tests can swap in a mocked container or a
//! container built over in-memory repositories.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, CategoryManager, CategoryService, DashboardAggregator,
    DashboardService, HistoryReader, HistoryService, OrderManager, OrderService, ProductManager,
    ProductService, UserManager, UserService,
};
use crate::config::Config;
use crate::infra::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn products(&self) -> Arc<dyn ProductService>;

    fn categories(&self) -> Arc<dyn CategoryService>;

    fn orders(&self) -> Arc<dyn OrderService>;

    fn histories(&self) -> Arc<dyn HistoryService>;

    fn dashboard(&self) -> Arc<dyn DashboardService>;
}

/// Concrete container sharing one unit of work between all services.
#[derive(Clone)]
pub struct Services {
    auth: Arc<dyn AuthService>,
    users: Arc<dyn UserService>,
    products: Arc<dyn ProductService>,
    categories: Arc<dyn CategoryService>,
    orders: Arc<dyn OrderService>,
    histories: Arc<dyn HistoryService>,
    dashboard: Arc<dyn DashboardService>,
}

impl Services {
    /// Wire every service over the given unit of work.
    pub fn from_unit_of_work<U: UnitOfWork + 'static>(uow: Arc<U>, config: Config) -> Self {
        Self {
            auth: Arc::new(Authenticator::new(uow.clone(), config)),
            users: Arc::new(UserManager::new(uow.clone())),
            products: Arc::new(ProductManager::new(uow.clone())),
            categories: Arc::new(CategoryManager::new(uow.clone())),
            orders: Arc::new(OrderManager::new(uow.clone())),
            histories: Arc::new(HistoryReader::new(uow.clone())),
            dashboard: Arc::new(DashboardAggregator::new(uow)),
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        Self::from_unit_of_work(Arc::new(Persistence::new(db)), config)
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.users.clone()
    }

    fn products(&self) -> Arc<dyn ProductService> {
        self.products.clone()
    }

    fn categories(&self) -> Arc<dyn CategoryService> {
        self.categories.clone()
    }

    fn orders(&self) -> Arc<dyn OrderService> {
        self.orders.clone()
    }

    fn histories(&self) -> Arc<dyn HistoryService> {
        self.histories.clone()
    }

    fn dashboard(&self) -> Arc<dyn DashboardService> {
        self.dashboard.clone()
    }
}
