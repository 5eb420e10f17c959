//! Order lifecycle.
//!
//! Creating an order takes stock out of every ordered product; cancelling
//! puts it back. Each movement is written to the history log with the order
//! id as reference. Stock writes go through compare-and-swap, and all input
//! checks run before the first write.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use super::stock::{adjust_stock, insufficient_stock};
use crate::domain::order::{quantities_by_product, total_amount};
use crate::domain::{
    HistoryAction, NewHistory, NewOrder, NewOrderItem, Order, OrderItem, OrderResponse,
    OrderStatus, Product, StatusChange, StockChange, StockSnapshot, User, UserRole,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::DateRange;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Order placement as submitted over HTTP or the realtime channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    /// Only honoured for administrators; clients always order for themselves.
    pub client_id: Option<Uuid>,
    pub items: Vec<NewOrderItem>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, actor: &User, request: PlaceOrder) -> AppResult<OrderResponse>;

    async fn update_status(
        &self,
        actor: &User,
        order_id: Uuid,
        change: StatusChange,
    ) -> AppResult<OrderResponse>;

    /// Clients see their own orders; every other role sees all of them.
    async fn list_orders(&self, viewer: &User, range: DateRange) -> AppResult<Vec<OrderResponse>>;

    /// Orders waiting on the viewer's role: pending for admins,
    /// dispatched for delivery staff, nothing for anyone else.
    async fn awaiting_count(&self, viewer: &User) -> AppResult<u64>;
}

pub struct OrderManager<U: UnitOfWork> {
    uow: Arc<U>,
}

fn validate_items(items: &[NewOrderItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::validation("Quantity must be greater than zero"));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(AppError::validation("Unit price must be zero or positive"));
        }
    }
    Ok(())
}

/// Who may move `order` to `target`.
fn authorize_transition(actor: &User, order: &Order, target: OrderStatus) -> AppResult<()> {
    match actor.role {
        UserRole::Admin | UserRole::Deliver => Ok(()),
        UserRole::Client if order.client_id == actor.id && target == OrderStatus::Cancelled => {
            Ok(())
        }
        _ => Err(AppError::Forbidden),
    }
}

impl<U: UnitOfWork> OrderManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn resolve_client(&self, actor: &User, requested: Option<Uuid>) -> AppResult<User> {
        match (actor.role, requested) {
            (UserRole::Client, _) => Ok(actor.clone()),
            (UserRole::Admin, None) => Ok(actor.clone()),
            (UserRole::Admin, Some(id)) if id == actor.id => Ok(actor.clone()),
            (UserRole::Admin, Some(id)) => self
                .uow
                .users()
                .find_by_id(id)
                .await?
                .ok_or_not_found("Client"),
            _ => Err(AppError::Forbidden),
        }
    }

    /// Load every ordered product and check the summed quantities against
    /// current stock.
    async fn check_availability(
        &self,
        quantities: &BTreeMap<Uuid, i32>,
    ) -> AppResult<HashMap<Uuid, Product>> {
        let mut products = HashMap::with_capacity(quantities.len());
        for (&product_id, &quantity) in quantities {
            let product = self
                .uow
                .products()
                .find_by_id(product_id)
                .await?
                .ok_or_not_found("Product")?;
            if product.stock_number < quantity {
                return Err(insufficient_stock(&product));
            }
            products.insert(product_id, product);
        }
        Ok(products)
    }

    async fn record_movement(
        &self,
        action: HistoryAction,
        change: &StockChange,
        actor: &User,
        order_id: Uuid,
    ) -> AppResult<()> {
        self.uow
            .histories()
            .append(
                NewHistory::new(action, &change.before, actor)
                    .old_value(StockSnapshot::stock(change.old_stock()))
                    .new_value(StockSnapshot::stock(change.new_stock))
                    .quantity(change.delta().abs())
                    .reference(order_id.to_string()),
            )
            .await?;
        Ok(())
    }

    /// Put stock back for every product of the order. Products deleted
    /// since the order was placed are skipped.
    async fn restock(
        &self,
        actor: &User,
        order_id: Uuid,
        quantities: impl IntoIterator<Item = (Uuid, i32)>,
    ) -> AppResult<()> {
        for (product_id, quantity) in quantities {
            let change = match adjust_stock(&*self.uow.products(), product_id, quantity).await {
                Ok(change) => change,
                Err(AppError::NotFound(_)) => {
                    tracing::warn!(%order_id, %product_id, "Product no longer exists, skipping restock");
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.record_movement(HistoryAction::StockIn, &change, actor, order_id)
                .await?;
        }
        Ok(())
    }

    /// Undo a partially applied order after a stock write lost a race.
    async fn roll_back(&self, actor: &User, order: &Order, applied: Vec<(Uuid, i32)>) {
        if let Err(e) = self.restock(actor, order.id, applied).await {
            tracing::error!(order_id = %order.id, error = %e, "Failed to restore stock for aborted order");
        }
        let cancelled = self
            .uow
            .orders()
            .update_status(order.id, OrderStatus::Pending, StatusChange::to(OrderStatus::Cancelled))
            .await;
        if let Err(e) = cancelled {
            tracing::error!(order_id = %order.id, error = %e, "Failed to cancel aborted order");
        }
    }

    async fn client_names(&self, orders: &[Order]) -> AppResult<HashMap<Uuid, String>> {
        let mut ids: Vec<Uuid> = orders.iter().map(|o| o.client_id).collect();
        ids.sort_unstable();
        ids.dedup();

        Ok(self
            .uow
            .users()
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect())
    }

    async fn respond(&self, order: Order) -> AppResult<OrderResponse> {
        let name = self
            .uow
            .users()
            .find_by_id(order.client_id)
            .await?
            .map(|user| user.name);
        Ok(OrderResponse::new(order, name))
    }
}

#[async_trait]
impl<U: UnitOfWork> OrderService for OrderManager<U> {
    #[tracing::instrument(skip(self, actor, request), fields(actor = %actor.id, items = request.items.len()))]
    async fn create_order(&self, actor: &User, request: PlaceOrder) -> AppResult<OrderResponse> {
        validate_items(&request.items)?;
        let client = self.resolve_client(actor, request.client_id).await?;

        let quantities =
            quantities_by_product(request.items.iter().map(|i| (i.product_id, i.quantity)))?;
        let products = self.check_availability(&quantities).await?;

        let items: Vec<OrderItem> = request
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id,
                product_name: products
                    .get(&item.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();

        let order = self
            .uow
            .orders()
            .create(NewOrder {
                id: Uuid::new_v4(),
                client_id: client.id,
                order_date: Utc::now(),
                total_amount: total_amount(&items),
                items,
            })
            .await?;

        let mut applied = Vec::with_capacity(quantities.len());
        for (&product_id, &quantity) in &quantities {
            let change = match adjust_stock(&*self.uow.products(), product_id, -quantity).await {
                Ok(change) => change,
                Err(e) => {
                    tracing::warn!(order_id = %order.id, %product_id, error = %e, "Stock update failed, rolling back order");
                    self.roll_back(actor, &order, applied).await;
                    return Err(e);
                }
            };
            applied.push((product_id, quantity));
            self.record_movement(HistoryAction::StockOut, &change, actor, order.id)
                .await?;
        }

        tracing::info!(order_id = %order.id, client_id = %client.id, total = order.total_amount, "Order created");
        Ok(OrderResponse::new(order, Some(client.name)))
    }

    #[tracing::instrument(skip(self, actor, change), fields(actor = %actor.id, status = %change.status))]
    async fn update_status(
        &self,
        actor: &User,
        order_id: Uuid,
        change: StatusChange,
    ) -> AppResult<OrderResponse> {
        let order = self
            .uow
            .orders()
            .find_by_id(order_id)
            .await?
            .ok_or_not_found("Order")?;

        authorize_transition(actor, &order, change.status)?;

        if order.status.is_terminal() {
            return Err(AppError::bad_request(format!(
                "Order is already {}",
                order.status
            )));
        }

        let target = change.status;
        let updated = self
            .uow
            .orders()
            .update_status(order_id, order.status, change)
            .await?
            .ok_or_else(|| {
                AppError::Concurrency("Order was modified concurrently, please retry".to_string())
            })?;

        if target == OrderStatus::Cancelled {
            let quantities =
                quantities_by_product(order.items.iter().map(|i| (i.product_id, i.quantity)))?;
            self.restock(actor, order_id, quantities).await?;
        }

        tracing::info!(%order_id, from = %order.status, to = %updated.status, "Order status changed");
        self.respond(updated).await
    }

    async fn list_orders(&self, viewer: &User, range: DateRange) -> AppResult<Vec<OrderResponse>> {
        let client_filter = viewer.is_client().then_some(viewer.id);
        let orders = self.uow.orders().list(client_filter, range).await?;
        let names = self.client_names(&orders).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let name = names.get(&order.client_id).cloned();
                OrderResponse::new(order, name)
            })
            .collect())
    }

    async fn awaiting_count(&self, viewer: &User) -> AppResult<u64> {
        let status = match viewer.role {
            UserRole::Admin => OrderStatus::Pending,
            UserRole::Deliver => OrderStatus::Dispatched,
            _ => return Ok(0),
        };
        self.uow.orders().count_with_status(status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{echo_history, test_order, test_product, test_user, MockRepositories};
    use mockall::predicate::{always, eq};

    fn place(product_id: Uuid, quantity: i32, unit_price: f64) -> PlaceOrder {
        PlaceOrder {
            client_id: None,
            items: vec![NewOrderItem {
                product_id,
                quantity,
                unit_price,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_order_decrements_stock_and_logs_stock_out() {
        let product = test_product("Tea", 10, 2);
        let product_id = product.id;
        let client = test_user(UserRole::Client);
        let client_id = client.id;

        let mut repos = MockRepositories::default();
        repos
            .products
            .expect_find_by_id()
            .with(eq(product_id))
            .returning(move |_| Ok(Some(product.clone())));
        repos
            .orders
            .expect_create()
            .withf(move |order| {
                order.client_id == client_id
                    && (order.total_amount - 30.0).abs() < f64::EPSILON
                    && order.items[0].product_name == "Tea"
            })
            .times(1)
            .returning(|new_order| Ok(test_order(new_order)));
        repos
            .products
            .expect_compare_and_set_stock()
            .with(eq(product_id), eq(10), eq(7))
            .times(1)
            .returning(|_, _, _| Ok(true));
        repos
            .histories
            .expect_append()
            .withf(|entry| {
                entry.action_type == HistoryAction::StockOut
                    && entry.details.quantity == Some(3)
                    && entry.details.reference.is_some()
            })
            .times(1)
            .returning(echo_history);

        let service = OrderManager::new(repos.into_unit_of_work());
        let order = service
            .create_order(&client, place(product_id, 3, 10.0))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.client_name.as_deref(), Some(client.name.as_str()));
        assert!((order.total_amount - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_create_order_moves_stock_once_per_product() {
        let product = test_product("Tea", 10, 2);
        let product_id = product.id;
        let client = test_user(UserRole::Client);

        let mut repos = MockRepositories::default();
        repos
            .products
            .expect_find_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repos
            .orders
            .expect_create()
            .returning(|new_order| Ok(test_order(new_order)));
        repos
            .products
            .expect_compare_and_set_stock()
            .with(eq(product_id), eq(10), eq(5))
            .times(1)
            .returning(|_, _, _| Ok(true));
        repos
            .histories
            .expect_append()
            .withf(|entry| entry.details.quantity == Some(5))
            .times(1)
            .returning(echo_history);

        let mut request = place(product_id, 2, 1.0);
        request.items.push(NewOrderItem {
            product_id,
            quantity: 3,
            unit_price: 1.0,
        });

        OrderManager::new(repos.into_unit_of_work())
            .create_order(&client, request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_order_insufficient_stock_writes_nothing() {
        let product = test_product("Tea", 2, 0);
        let product_id = product.id;

        let mut repos = MockRepositories::default();
        repos
            .products
            .expect_find_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repos.orders.expect_create().never();
        repos.products.expect_compare_and_set_stock().never();
        repos.histories.expect_append().never();

        let err = OrderManager::new(repos.into_unit_of_work())
            .create_order(&test_user(UserRole::Client), place(product_id, 3, 10.0))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "Insufficient stock for Tea");
    }

    #[tokio::test]
    async fn test_create_order_rejects_overflowing_duplicate_lines() {
        let product_id = Uuid::new_v4();
        let line = NewOrderItem {
            product_id,
            quantity: i32::MAX,
            unit_price: 1.0,
        };

        let mut repos = MockRepositories::default();
        repos.products.expect_find_by_id().never();
        repos.orders.expect_create().never();
        repos.products.expect_compare_and_set_stock().never();
        repos.histories.expect_append().never();

        let err = OrderManager::new(repos.into_unit_of_work())
            .create_order(
                &test_user(UserRole::Client),
                PlaceOrder {
                    client_id: None,
                    items: vec![line.clone(), line],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_order_validates_items() {
        let service = OrderManager::new(MockRepositories::default().into_unit_of_work());
        let client = test_user(UserRole::Client);

        let empty = PlaceOrder {
            client_id: None,
            items: Vec::new(),
        };
        assert!(matches!(
            service.create_order(&client, empty).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service
                .create_order(&client, place(Uuid::new_v4(), 0, 1.0))
                .await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service
                .create_order(&client, place(Uuid::new_v4(), 1, -1.0))
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_client_cannot_order_for_someone_else() {
        let product = test_product("Tea", 10, 0);
        let product_id = product.id;
        let client = test_user(UserRole::Client);
        let client_id = client.id;

        let mut repos = MockRepositories::default();
        repos.users.expect_find_by_id().never();
        repos
            .products
            .expect_find_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repos
            .orders
            .expect_create()
            .withf(move |order| order.client_id == client_id)
            .returning(|new_order| Ok(test_order(new_order)));
        repos
            .products
            .expect_compare_and_set_stock()
            .returning(|_, _, _| Ok(true));
        repos.histories.expect_append().returning(echo_history);

        let mut request = place(product_id, 1, 1.0);
        request.client_id = Some(Uuid::new_v4());

        let order = OrderManager::new(repos.into_unit_of_work())
            .create_order(&client, request)
            .await
            .unwrap();
        assert_eq!(order.client_id, client_id);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_logs_stock_in() {
        let client = test_user(UserRole::Client);
        let product = test_product("Tea", 7, 2);
        let product_id = product.id;
        let order = test_order(NewOrder {
            id: Uuid::new_v4(),
            client_id: client.id,
            order_date: Utc::now(),
            items: vec![OrderItem {
                product_id,
                product_name: "Tea".into(),
                quantity: 3,
                unit_price: 10.0,
            }],
            total_amount: 30.0,
        });
        let order_id = order.id;
        let stored = order.clone();
        let client_copy = client.clone();

        let mut repos = MockRepositories::default();
        repos
            .orders
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repos
            .orders
            .expect_update_status()
            .with(eq(order_id), eq(OrderStatus::Pending), always())
            .times(1)
            .returning(move |_, _, change| {
                let mut updated = order.clone();
                updated.status = change.status;
                Ok(Some(updated))
            });
        repos
            .products
            .expect_find_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        repos
            .products
            .expect_compare_and_set_stock()
            .with(eq(product_id), eq(7), eq(10))
            .times(1)
            .returning(|_, _, _| Ok(true));
        repos
            .histories
            .expect_append()
            .withf(move |entry| {
                entry.action_type == HistoryAction::StockIn
                    && entry.details.quantity == Some(3)
                    && entry.details.reference.as_deref() == Some(order_id.to_string().as_str())
            })
            .times(1)
            .returning(echo_history);
        repos
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(client_copy.clone())));

        let response = OrderManager::new(repos.into_unit_of_work())
            .update_status(&client, order_id, StatusChange::to(OrderStatus::Cancelled))
            .await
            .unwrap();

        assert_eq!(response.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelling_twice_is_rejected_without_restock() {
        let admin = test_user(UserRole::Admin);
        let mut order = test_order(NewOrder {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            order_date: Utc::now(),
            items: Vec::new(),
            total_amount: 0.0,
        });
        order.status = OrderStatus::Cancelled;
        let order_id = order.id;

        let mut repos = MockRepositories::default();
        repos
            .orders
            .expect_find_by_id()
            .returning(move |_| Ok(Some(order.clone())));
        repos.orders.expect_update_status().never();
        repos.products.expect_compare_and_set_stock().never();
        repos.histories.expect_append().never();

        let err = OrderManager::new(repos.into_unit_of_work())
            .update_status(&admin, order_id, StatusChange::to(OrderStatus::Cancelled))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_client_may_not_advance_or_touch_other_orders() {
        let client = test_user(UserRole::Client);
        let own = test_order(NewOrder {
            id: Uuid::new_v4(),
            client_id: client.id,
            order_date: Utc::now(),
            items: Vec::new(),
            total_amount: 0.0,
        });
        let foreign = test_order(NewOrder {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            order_date: Utc::now(),
            items: Vec::new(),
            total_amount: 0.0,
        });
        let (own_id, foreign_id) = (own.id, foreign.id);

        let mut repos = MockRepositories::default();
        repos.orders.expect_find_by_id().returning(move |id| {
            if id == own.id {
                Ok(Some(own.clone()))
            } else {
                Ok(Some(foreign.clone()))
            }
        });
        repos.orders.expect_update_status().never();
        let service = OrderManager::new(repos.into_unit_of_work());

        let advance = service
            .update_status(&client, own_id, StatusChange::to(OrderStatus::Dispatched))
            .await;
        assert!(matches!(advance, Err(AppError::Forbidden)));

        let cancel_foreign = service
            .update_status(&client, foreign_id, StatusChange::to(OrderStatus::Cancelled))
            .await;
        assert!(matches!(cancel_foreign, Err(AppError::Forbidden)));

        let user_role = service
            .update_status(
                &test_user(UserRole::User),
                own_id,
                StatusChange::to(OrderStatus::Confirmed),
            )
            .await;
        assert!(matches!(user_role, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_client_lists_only_own_orders() {
        let client = test_user(UserRole::Client);
        let client_id = client.id;

        let mut repos = MockRepositories::default();
        repos
            .orders
            .expect_list()
            .with(eq(Some(client_id)), always())
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        repos
            .users
            .expect_find_by_ids()
            .returning(|_| Ok(Vec::new()));

        let orders = OrderManager::new(repos.into_unit_of_work())
            .list_orders(&client, DateRange::unbounded())
            .await
            .unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_staff_list_all_orders_with_client_names() {
        let deliver = test_user(UserRole::Deliver);
        let client = test_user(UserRole::Client);
        let order = test_order(NewOrder {
            id: Uuid::new_v4(),
            client_id: client.id,
            order_date: Utc::now(),
            items: Vec::new(),
            total_amount: 0.0,
        });

        let mut repos = MockRepositories::default();
        repos
            .orders
            .expect_list()
            .with(eq(None), always())
            .times(1)
            .returning(move |_, _| Ok(vec![order.clone()]));
        repos
            .users
            .expect_find_by_ids()
            .returning(move |_| Ok(vec![client.clone()]));

        let orders = OrderManager::new(repos.into_unit_of_work())
            .list_orders(&deliver, DateRange::unbounded())
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].client_name.is_some());
    }

    #[tokio::test]
    async fn test_awaiting_count_depends_on_role() {
        let mut repos = MockRepositories::default();
        repos
            .orders
            .expect_count_with_status()
            .with(eq(OrderStatus::Pending))
            .returning(|_| Ok(4));
        repos
            .orders
            .expect_count_with_status()
            .with(eq(OrderStatus::Dispatched))
            .returning(|_| Ok(2));
        let service = OrderManager::new(repos.into_unit_of_work());

        assert_eq!(service.awaiting_count(&test_user(UserRole::Admin)).await.unwrap(), 4);
        assert_eq!(service.awaiting_count(&test_user(UserRole::Deliver)).await.unwrap(), 2);
        assert_eq!(service.awaiting_count(&test_user(UserRole::Client)).await.unwrap(), 0);
    }
}
