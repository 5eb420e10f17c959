//! In-memory persistence for router-level tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use inventory_api::api::{create_router, AppState};
use inventory_api::config::Config;
use inventory_api::domain::{
    Category, CategoryChanges, History, HistoryAction, NewHistory, NewOrder, NewProduct,
    NewUser, Order, OrderStatus, Password, Product, ProductChanges, ProductMovement,
    StatusChange, StockSummary, User, UserChanges, UserRole, UserStatus,
};
use inventory_api::errors::{AppError, AppResult};
use inventory_api::infra::{
    CategoryRepository, HistoryRepository, OrderRepository, ProductRepository, UnitOfWork,
    UserRepository,
};
use inventory_api::services::{AuthService, ServiceContainer, Services};
use inventory_api::types::DateRange;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";
pub const CLIENT_URL: &str = "http://localhost:3000";

fn within(range: &DateRange, at: &DateTime<Utc>) -> bool {
    range.from.map_or(true, |from| *at >= from) && range.to.map_or(true, |to| *at <= to)
}

#[derive(Default)]
pub struct MemoryUsers(Mutex<HashMap<Uuid, User>>);

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>> {
        let users = self.0.lock().unwrap();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.0.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::conflict("email"));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            status: user.status,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let mut users = self.0.lock().unwrap();
        let user = users.get_mut(&id).ok_or_else(|| AppError::not_found("User"))?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_password(&self, id: Uuid, password_hash: String) -> AppResult<()> {
        let mut users = self.0.lock().unwrap();
        let user = users.get_mut(&id).ok_or_else(|| AppError::not_found("User"))?;
        user.password_hash = password_hash;
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryCategories(Mutex<HashMap<Uuid, Category>>);

#[async_trait]
impl CategoryRepository for MemoryCategories {
    async fn list(&self) -> AppResult<Vec<Category>> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, name: String, description: Option<String>) -> AppResult<Category> {
        let mut categories = self.0.lock().unwrap();
        if categories.values().any(|c| c.name == name) {
            return Err(AppError::conflict("name"));
        }
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name,
            description,
            created_at: now,
            updated_at: now,
        };
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: Uuid, changes: CategoryChanges) -> AppResult<Category> {
        let mut categories = self.0.lock().unwrap();
        let category = categories
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Category"))?;
        if let Some(name) = changes.name {
            category.name = name;
        }
        if let Some(description) = changes.description {
            category.description = Some(description);
        }
        Ok(category.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.0.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryProducts(Mutex<HashMap<Uuid, Product>>);

#[async_trait]
impl ProductRepository for MemoryProducts {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Product>> {
        Ok(self.0.lock().unwrap().values().cloned().collect())
    }

    async fn stock_summary(&self) -> AppResult<StockSummary> {
        let products = self.0.lock().unwrap();
        let units: i64 = products.values().map(|p| i64::from(p.stock_number)).sum();
        let low = products
            .values()
            .filter(|p| p.stock_number <= p.low_stock_threshold)
            .count();
        Ok(StockSummary::from_counts(products.len() as i64, units, low as i64))
    }

    async fn create(&self, product: NewProduct) -> AppResult<Product> {
        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name,
            category_id: product.category_id,
            description: product.description,
            image: product.image,
            stock_number: product.stock_number,
            price: product.price,
            low_stock_threshold: product.low_stock_threshold,
            created_at: now,
            updated_at: now,
        };
        self.0.lock().unwrap().insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product> {
        let mut products = self.0.lock().unwrap();
        let product = products
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Product"))?;
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(threshold) = changes.low_stock_threshold {
            product.low_stock_threshold = threshold;
        }
        if changes.category_id.is_some() {
            product.category_id = changes.category_id;
        }
        Ok(product.clone())
    }

    async fn compare_and_set_stock(&self, id: Uuid, expected: i32, new: i32) -> AppResult<bool> {
        let mut products = self.0.lock().unwrap();
        match products.get_mut(&id) {
            Some(product) if product.stock_number == expected => {
                product.stock_number = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.0.lock().unwrap().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryOrders(Mutex<HashMap<Uuid, Order>>);

#[async_trait]
impl OrderRepository for MemoryOrders {
    async fn create(&self, order: NewOrder) -> AppResult<Order> {
        let created = Order {
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
        };
        self.0.lock().unwrap().insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        change: StatusChange,
    ) -> AppResult<Option<Order>> {
        let mut orders = self.0.lock().unwrap();
        match orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.status = change.status;
                if change.delivery_agent.is_some() {
                    order.delivery_agent = change.delivery_agent;
                }
                if change.delivery_date.is_some() {
                    order.delivery_date = change.delivery_date;
                }
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list(&self, client_id: Option<Uuid>, range: DateRange) -> AppResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|o| client_id.map_or(true, |id| o.client_id == id))
            .filter(|o| within(&range, &o.order_date))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn count_by_status(&self) -> AppResult<Vec<(OrderStatus, u64)>> {
        let mut counts: HashMap<OrderStatus, u64> = HashMap::new();
        for order in self.0.lock().unwrap().values() {
            *counts.entry(order.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_with_status(&self, status: OrderStatus) -> AppResult<u64> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.status == status)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct MemoryHistories(Mutex<Vec<History>>);

#[async_trait]
impl HistoryRepository for MemoryHistories {
    async fn append(&self, entry: NewHistory) -> AppResult<History> {
        let history = History {
            id: Uuid::new_v4(),
            product_id: entry.product_id,
            product_name: entry.product_name,
            action_type: entry.action_type,
            user_id: entry.user_id,
            user_name: entry.user_name,
            details: entry.details,
            timestamp: Utc::now(),
        };
        self.0.lock().unwrap().push(history.clone());
        Ok(history)
    }

    async fn list(&self, range: DateRange) -> AppResult<Vec<History>> {
        let mut entries: Vec<History> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|h| within(&range, &h.timestamp))
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }

    async fn stock_movements(&self, range: DateRange) -> AppResult<Vec<ProductMovement>> {
        let mut totals: BTreeMap<(String, Uuid), (HistoryAction, i64)> = BTreeMap::new();
        for entry in self.list(range).await? {
            if !entry.action_type.is_stock_movement() {
                continue;
            }
            let key = (entry.action_type.as_str().to_string(), entry.product_id);
            let quantity = i64::from(entry.details.quantity.unwrap_or(0).abs());
            totals.entry(key).or_insert((entry.action_type, 0)).1 += quantity;
        }
        Ok(totals
            .into_iter()
            .map(|((_, product_id), (action, quantity))| ProductMovement {
                action,
                product_id,
                quantity,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub users: Arc<MemoryUsers>,
    pub categories: Arc<MemoryCategories>,
    pub products: Arc<MemoryProducts>,
    pub orders: Arc<MemoryOrders>,
    pub histories: Arc<MemoryHistories>,
}

impl UnitOfWork for MemoryStore {
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

impl MemoryStore {
    pub fn stock_of(&self, product_id: Uuid) -> i32 {
        self.products.0.lock().unwrap()[&product_id].stock_number
    }

    /// Shift every stored order and history entry into the past.
    pub fn backdate(&self, by: Duration) {
        for order in self.orders.0.lock().unwrap().values_mut() {
            order.order_date -= by;
            order.created_at -= by;
        }
        for entry in self.histories.0.lock().unwrap().iter_mut() {
            entry.timestamp -= by;
        }
    }

    pub fn histories_of(&self, action: HistoryAction) -> Vec<History> {
        self.histories
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.action_type == action)
            .cloned()
            .collect()
    }
}

/// Router over in-memory storage plus handles to seed and inspect it.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub services: Arc<Services>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let services = Arc::new(Services::from_unit_of_work(
            store.clone(),
            Config::with_secret(TEST_SECRET),
        ));
        let state = AppState::new(services.clone());
        Self {
            store,
            services,
            state,
        }
    }

    pub fn router(&self) -> axum::Router {
        create_router(self.state.clone(), CLIENT_URL)
    }

    /// Seed a verified account and return it with a bearer token.
    pub async fn user(&self, role: UserRole, email: &str, password: &str) -> (User, String) {
        let user = self
            .store
            .users
            .create(NewUser {
                name: format!("{} user", role),
                email: email.to_string(),
                phone: "0123456789".to_string(),
                password_hash: Password::new(password).unwrap().into_string(),
                role,
                status: UserStatus::Verify,
            })
            .await
            .unwrap();
        let token = self.services.auth().issue_token(&user).unwrap().access_token;
        (user, token)
    }

    pub async fn product(&self, name: &str, stock: i32, threshold: i32) -> Product {
        self.store
            .products
            .create(NewProduct {
                name: name.to_string(),
                category_id: None,
                description: None,
                image: None,
                stock_number: stock,
                price: 10.0,
                low_stock_threshold: threshold,
            })
            .await
            .unwrap()
    }
}
