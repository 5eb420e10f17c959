//! Fixtures shared by the unit tests.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    History, NewHistory, NewOrder, Order, OrderStatus, Product, User, UserRole, UserStatus,
};
use crate::errors::AppResult;
use crate::infra::{
    CategoryRepository, HistoryRepository, MockCategoryRepository, MockHistoryRepository,
    MockOrderRepository, MockProductRepository, MockUserRepository, OrderRepository,
    ProductRepository, UnitOfWork, UserRepository,
};

/// One mock per repository. Set expectations, then hand the lot to a
/// service with [`MockRepositories::into_unit_of_work`].
#[derive(Default)]
pub struct MockRepositories {
    pub users: MockUserRepository,
    pub categories: MockCategoryRepository,
    pub products: MockProductRepository,
    pub orders: MockOrderRepository,
    pub histories: MockHistoryRepository,
}

impl MockRepositories {
    pub fn into_unit_of_work(self) -> Arc<TestUnitOfWork> {
        Arc::new(TestUnitOfWork {
            users: Arc::new(self.users),
            categories: Arc::new(self.categories),
            products: Arc::new(self.products),
            orders: Arc::new(self.orders),
            histories: Arc::new(self.histories),
        })
    }
}

pub struct TestUnitOfWork {
    users: Arc<MockUserRepository>,
    categories: Arc<MockCategoryRepository>,
    products: Arc<MockProductRepository>,
    orders: Arc<MockOrderRepository>,
    histories: Arc<MockHistoryRepository>,
}

impl UnitOfWork for TestUnitOfWork {
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

pub fn test_config() -> Config {
    Config::with_secret("unit-test-secret-that-is-at-least-32-chars")
}

pub fn test_user(role: UserRole) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        phone: "0123456789".to_string(),
        password_hash: String::new(),
        role,
        status: UserStatus::Verify,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_product(name: &str, stock: i32, threshold: i32) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category_id: None,
        description: None,
        image: None,
        stock_number: stock,
        price: 10.0,
        low_stock_threshold: threshold,
        created_at: now,
        updated_at: now,
    }
}

/// Pending order exactly as the repository would store it.
pub fn test_order(order: NewOrder) -> Order {
    Order {
        id: order.id,
        client_id: order.client_id,
        order_date: order.order_date,
        status: OrderStatus::Pending,
        items: order.items,
        total_amount: order.total_amount,
        delivery_agent: None,
        delivery_date: None,
        created_at: order.order_date,
        updated_at: order.order_date,
    }
}

/// Stand-in for `HistoryRepository::append`.
pub fn echo_history(entry: NewHistory) -> AppResult<History> {
    Ok(History {
        id: Uuid::new_v4(),
        product_id: entry.product_id,
        product_name: entry.product_name,
        action_type: entry.action_type,
        user_id: entry.user_id,
        user_name: entry.user_name,
        details: entry.details,
        timestamp: Utc::now(),
    })
}
