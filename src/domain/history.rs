//! Append-only audit trail of catalog and stock changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    HISTORY_ACTION_DELETE, HISTORY_ACTION_NEW, HISTORY_ACTION_STOCK_IN, HISTORY_ACTION_STOCK_OUT,
    HISTORY_ACTION_UPDATE,
};

use super::product::Product;
use super::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryAction {
    New,
    Update,
    Delete,
    StockIn,
    StockOut,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::New => HISTORY_ACTION_NEW,
            HistoryAction::Update => HISTORY_ACTION_UPDATE,
            HistoryAction::Delete => HISTORY_ACTION_DELETE,
            HistoryAction::StockIn => HISTORY_ACTION_STOCK_IN,
            HistoryAction::StockOut => HISTORY_ACTION_STOCK_OUT,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            HISTORY_ACTION_NEW => Some(HistoryAction::New),
            HISTORY_ACTION_UPDATE => Some(HistoryAction::Update),
            HISTORY_ACTION_DELETE => Some(HistoryAction::Delete),
            HISTORY_ACTION_STOCK_IN => Some(HistoryAction::StockIn),
            HISTORY_ACTION_STOCK_OUT => Some(HistoryAction::StockOut),
            _ => None,
        }
    }

    pub fn is_stock_movement(&self) -> bool {
        matches!(self, HistoryAction::StockIn | HistoryAction::StockOut)
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock level and price at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub stock_level: Option<i32>,
    pub price: Option<f64>,
}

impl StockSnapshot {
    pub fn of(product: &Product) -> Self {
        Self {
            stock_level: Some(product.stock_number),
            price: Some(product.price),
        }
    }

    pub fn stock(level: i32) -> Self {
        Self {
            stock_level: Some(level),
            price: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDetails {
    pub old_value: Option<StockSnapshot>,
    pub new_value: Option<StockSnapshot>,
    pub quantity: Option<i32>,
    /// Order id for stock moved by an order.
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub action_type: HistoryAction,
    pub user_id: Uuid,
    pub user_name: String,
    pub details: HistoryDetails,
    pub timestamp: DateTime<Utc>,
}

/// Entry to append. Display names are snapshotted from the product and
/// actor so the record survives later renames and deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistory {
    pub product_id: Uuid,
    pub product_name: String,
    pub action_type: HistoryAction,
    pub user_id: Uuid,
    pub user_name: String,
    pub details: HistoryDetails,
}

impl NewHistory {
    pub fn new(action: HistoryAction, product: &Product, actor: &User) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            action_type: action,
            user_id: actor.id,
            user_name: actor.name.clone(),
            details: HistoryDetails::default(),
        }
    }

    pub fn old_value(mut self, snapshot: StockSnapshot) -> Self {
        self.details.old_value = Some(snapshot);
        self
    }

    pub fn new_value(mut self, snapshot: StockSnapshot) -> Self {
        self.details.new_value = Some(snapshot);
        self
    }

    pub fn quantity(mut self, quantity: i32) -> Self {
        self.details.quantity = Some(quantity);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.details.reference = Some(reference.into());
        self
    }
}
