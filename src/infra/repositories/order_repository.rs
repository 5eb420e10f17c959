//! Order persistence.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::entities::order::{self, ActiveModel, Entity as OrderEntity};
use crate::domain::{NewOrder, Order, OrderStatus, StatusChange};
use crate::errors::{AppError, AppResult};
use crate::types::DateRange;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order in `pending`.
    async fn create(&self, order: NewOrder) -> AppResult<Order>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

    /// Apply `change` only if the order is still in `expected`.
    /// `None` means the order moved on (or vanished) in the meantime.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        change: StatusChange,
    ) -> AppResult<Option<Order>>;

    /// Newest first, optionally restricted to one client.
    async fn list(&self, client_id: Option<Uuid>, range: DateRange) -> AppResult<Vec<Order>>;

    /// Per-status totals; statuses without orders are omitted.
    async fn count_by_status(&self) -> AppResult<Vec<(OrderStatus, u64)>>;

    async fn count_with_status(&self, status: OrderStatus) -> AppResult<u64>;
}

pub struct OrderStore {
    db: DatabaseConnection,
}

impl OrderStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn within(mut query: Select<OrderEntity>, range: DateRange) -> Select<OrderEntity> {
    if let Some(from) = range.from {
        query = query.filter(order::Column::OrderDate.gte(from));
    }
    if let Some(to) = range.to {
        query = query.filter(order::Column::OrderDate.lte(to));
    }
    query
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn create(&self, new_order: NewOrder) -> AppResult<Order> {
        let items = serde_json::to_value(&new_order.items)
            .map_err(|e| AppError::internal(format!("failed to encode order items: {}", e)))?;
        let now = chrono::Utc::now();

        let model = ActiveModel {
            id: Set(new_order.id),
            client_id: Set(new_order.client_id),
            order_date: Set(new_order.order_date),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            items: Set(items),
            total_amount: Set(new_order.total_amount),
            delivery_agent: Set(None),
            delivery_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(AppError::from)?;

        Order::try_from(model)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        OrderEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?
            .map(Order::try_from)
            .transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        change: StatusChange,
    ) -> AppResult<Option<Order>> {
        let mut update = OrderEntity::update_many()
            .col_expr(order::Column::Status, Expr::value(change.status.as_str()))
            .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()));
        if let Some(agent) = change.delivery_agent {
            update = update.col_expr(order::Column::DeliveryAgent, Expr::value(agent));
        }
        if let Some(date) = change.delivery_date {
            update = update.col_expr(order::Column::DeliveryDate, Expr::value(date));
        }

        let result = update
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(expected.as_str()))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn list(&self, client_id: Option<Uuid>, range: DateRange) -> AppResult<Vec<Order>> {
        let mut query = within(OrderEntity::find(), range);
        if let Some(client_id) = client_id {
            query = query.filter(order::Column::ClientId.eq(client_id));
        }

        let models = query
            .order_by_desc(order::Column::OrderDate)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(Order::try_from).collect()
    }

    async fn count_by_status(&self) -> AppResult<Vec<(OrderStatus, u64)>> {
        let rows: Vec<(String, i64)> = OrderEntity::find()
            .select_only()
            .column(order::Column::Status)
            .column_as(Expr::col(order::Column::Id).count(), "count")
            .group_by(order::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| match OrderStatus::parse(&status) {
                Some(status) => Some((status, count.max(0) as u64)),
                None => {
                    tracing::warn!(%status, "Ignoring orders with unknown status");
                    None
                }
            })
            .collect())
    }

    async fn count_with_status(&self, status: OrderStatus) -> AppResult<u64> {
        OrderEntity::find()
            .filter(order::Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await
            .map_err(AppError::from)
    }
}
