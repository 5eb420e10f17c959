//! Order table entity. Line items live in a jsonb column.

use sea_orm::entity::prelude::*;

use crate::domain::{Order, OrderItem, OrderStatus};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: Uuid,
    pub order_date: DateTimeUtc,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub items: Json,
    #[sea_orm(column_type = "Double")]
    pub total_amount: f64,
    pub delivery_agent: Option<String>,
    pub delivery_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Order {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&model.status).ok_or_else(|| {
            AppError::internal(format!(
                "order {} has unknown status '{}'",
                model.id, model.status
            ))
        })?;
        let items: Vec<OrderItem> = serde_json::from_value(model.items).map_err(|e| {
            AppError::internal(format!("order {} has malformed items: {}", model.id, e))
        })?;

        Ok(Order {
            id: model.id,
            client_id: model.client_id,
            order_date: model.order_date,
            status,
            items,
            total_amount: model.total_amount,
            delivery_agent: model.delivery_agent,
            delivery_date: model.delivery_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
