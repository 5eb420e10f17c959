//! History table entity. Detail snapshots are flattened into typed columns.

use sea_orm::entity::prelude::*;

use crate::domain::{History, HistoryAction, HistoryDetails, StockSnapshot};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "histories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub action_type: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub old_stock_level: Option<i32>,
    #[sea_orm(column_type = "Double", nullable)]
    pub old_price: Option<f64>,
    pub new_stock_level: Option<i32>,
    #[sea_orm(column_type = "Double", nullable)]
    pub new_price: Option<f64>,
    pub quantity: Option<i32>,
    pub reference: Option<String>,
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn snapshot(stock_level: Option<i32>, price: Option<f64>) -> Option<StockSnapshot> {
    if stock_level.is_none() && price.is_none() {
        return None;
    }
    Some(StockSnapshot { stock_level, price })
}

impl TryFrom<Model> for History {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let action_type = HistoryAction::parse(&model.action_type).ok_or_else(|| {
            AppError::internal(format!(
                "history {} has unknown action '{}'",
                model.id, model.action_type
            ))
        })?;

        Ok(History {
            id: model.id,
            product_id: model.product_id,
            product_name: model.product_name,
            action_type,
            user_id: model.user_id,
            user_name: model.user_name,
            details: HistoryDetails {
                old_value: snapshot(model.old_stock_level, model.old_price),
                new_value: snapshot(model.new_stock_level, model.new_price),
                quantity: model.quantity,
                reference: model.reference,
            },
            timestamp: model.timestamp,
        })
    }
}
