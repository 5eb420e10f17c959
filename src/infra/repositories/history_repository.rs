//! Append-only history persistence; no update or delete operation exists.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::entities::history::{self, ActiveModel, Entity as HistoryEntity};
use crate::domain::{History, HistoryAction, NewHistory, ProductMovement};
use crate::errors::{AppError, AppResult};
use crate::types::DateRange;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, entry: NewHistory) -> AppResult<History>;

    /// Newest first.
    async fn list(&self, range: DateRange) -> AppResult<Vec<History>>;

    /// Stock-in and stock-out units summed per action and product.
    async fn stock_movements(&self, range: DateRange) -> AppResult<Vec<ProductMovement>>;
}

pub struct HistoryStore {
    db: DatabaseConnection,
}

impl HistoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(&self, query: Select<HistoryEntity>) -> AppResult<Vec<History>> {
        let models = query
            .order_by_desc(history::Column::Timestamp)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        models.into_iter().map(History::try_from).collect()
    }
}

fn within(mut query: Select<HistoryEntity>, range: DateRange) -> Select<HistoryEntity> {
    if let Some(from) = range.from {
        query = query.filter(history::Column::Timestamp.gte(from));
    }
    if let Some(to) = range.to {
        query = query.filter(history::Column::Timestamp.lte(to));
    }
    query
}

#[async_trait]
impl HistoryRepository for HistoryStore {
    async fn append(&self, entry: NewHistory) -> AppResult<History> {
        let old = entry.details.old_value.unwrap_or_default();
        let new = entry.details.new_value.unwrap_or_default();

        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(entry.product_id),
            product_name: Set(entry.product_name),
            action_type: Set(entry.action_type.as_str().to_string()),
            user_id: Set(entry.user_id),
            user_name: Set(entry.user_name),
            old_stock_level: Set(old.stock_level),
            old_price: Set(old.price),
            new_stock_level: Set(new.stock_level),
            new_price: Set(new.price),
            quantity: Set(entry.details.quantity),
            reference: Set(entry.details.reference),
            timestamp: Set(chrono::Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(AppError::from)?;

        History::try_from(model)
    }

    async fn list(&self, range: DateRange) -> AppResult<Vec<History>> {
        self.fetch(within(HistoryEntity::find(), range)).await
    }

    async fn stock_movements(&self, range: DateRange) -> AppResult<Vec<ProductMovement>> {
        let rows: Vec<(String, Uuid, i64)> = within(HistoryEntity::find(), range)
            .filter(history::Column::ActionType.is_in([
                HistoryAction::StockIn.as_str(),
                HistoryAction::StockOut.as_str(),
            ]))
            .select_only()
            .column(history::Column::ActionType)
            .column(history::Column::ProductId)
            .column_as(Expr::cust("COALESCE(SUM(ABS(quantity)), 0)"), "quantity")
            .group_by(history::Column::ActionType)
            .group_by(history::Column::ProductId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|(action, product_id, quantity)| {
                HistoryAction::parse(&action)
                    .filter(HistoryAction::is_stock_movement)
                    .map(|action| ProductMovement {
                        action,
                        product_id,
                        quantity,
                    })
            })
            .collect())
    }
}
