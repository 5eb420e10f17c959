//! Product table entity.

use sea_orm::entity::prelude::*;

use crate::domain::Product;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock_number: i32,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub low_stock_threshold: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Product {
            id: model.id,
            name: model.name,
            category_id: model.category_id,
            description: model.description,
            image: model.image,
            stock_number: model.stock_number,
            price: model.price,
            low_stock_threshold: model.low_stock_threshold,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
