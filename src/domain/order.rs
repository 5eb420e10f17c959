//! Orders and their lifecycle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    ORDER_STATUS_CANCELLED, ORDER_STATUS_CONFIRMED, ORDER_STATUS_DISPATCHED,
    ORDER_STATUS_IN_TRANSIT, ORDER_STATUS_PENDING,
};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Dispatched,
    #[serde(rename = "in-transit", alias = "transit")]
    InTransit,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Dispatched,
        OrderStatus::InTransit,
        OrderStatus::Cancelled,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ORDER_STATUS_PENDING => Some(OrderStatus::Pending),
            ORDER_STATUS_CONFIRMED => Some(OrderStatus::Confirmed),
            ORDER_STATUS_DISPATCHED => Some(OrderStatus::Dispatched),
            ORDER_STATUS_IN_TRANSIT | "transit" => Some(OrderStatus::InTransit),
            ORDER_STATUS_CANCELLED => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => ORDER_STATUS_PENDING,
            OrderStatus::Confirmed => ORDER_STATUS_CONFIRMED,
            OrderStatus::Dispatched => ORDER_STATUS_DISPATCHED,
            OrderStatus::InTransit => ORDER_STATUS_IN_TRANSIT,
            OrderStatus::Cancelled => ORDER_STATUS_CANCELLED,
        }
    }

    /// No transition may leave a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line item as stored on the order, with the product name captured at
/// creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
}

/// Line item as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: Uuid,
    #[schema(example = 3)]
    pub quantity: i32,
    #[schema(example = 10.0)]
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub client_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub delivery_agent: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record handed to the order store; the id is chosen up front so stock
/// history can reference it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub id: Uuid,
    pub client_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
}

/// Requested status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub delivery_agent: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn to(status: OrderStatus) -> Self {
        Self {
            status,
            delivery_agent: None,
            delivery_date: None,
        }
    }
}

/// Order with the client's display name joined in.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: Option<String>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub delivery_agent: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderResponse {
    pub fn new(order: Order, client_name: Option<String>) -> Self {
        Self {
            id: order.id,
            client_id: order.client_id,
            client_name,
            order_date: order.order_date,
            status: order.status,
            items: order.items,
            total_amount: order.total_amount,
            delivery_agent: order.delivery_agent,
            delivery_date: order.delivery_date,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Sum of quantity × unit price.
pub fn total_amount<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> f64 {
    items
        .into_iter()
        .map(|item| f64::from(item.quantity) * item.unit_price)
        .sum()
}

/// Quantities summed per product, in a stable order. An order may list the
/// same product on several lines; stock moves once per product.
pub fn quantities_by_product(
    lines: impl IntoIterator<Item = (Uuid, i32)>,
) -> AppResult<BTreeMap<Uuid, i32>> {
    let mut quantities = BTreeMap::new();
    for (product_id, quantity) in lines {
        let total = quantities.entry(product_id).or_insert(0i32);
        *total = total
            .checked_add(quantity)
            .ok_or_else(|| AppError::validation("Ordered quantity is too large"))?;
    }
    Ok(quantities)
}
