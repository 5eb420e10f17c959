//! Dashboard aggregates.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::history::HistoryAction;
use super::order::OrderStatus;
use super::product::StockSummary;

/// Order counts keyed by status; every status is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderStatusCounts {
    pub pending: u64,
    pub confirmed: u64,
    pub dispatched: u64,
    pub transit: u64,
    pub cancelled: u64,
}

impl OrderStatusCounts {
    pub fn from_counts(counts: impl IntoIterator<Item = (OrderStatus, u64)>) -> Self {
        counts
            .into_iter()
            .fold(Self::default(), |mut acc, (status, count)| {
                *acc.slot(status) += count;
                acc
            })
    }

    pub fn get(&self, status: OrderStatus) -> u64 {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Confirmed => self.confirmed,
            OrderStatus::Dispatched => self.dispatched,
            OrderStatus::InTransit => self.transit,
            OrderStatus::Cancelled => self.cancelled,
        }
    }

    fn slot(&mut self, status: OrderStatus) -> &mut u64 {
        match status {
            OrderStatus::Pending => &mut self.pending,
            OrderStatus::Confirmed => &mut self.confirmed,
            OrderStatus::Dispatched => &mut self.dispatched,
            OrderStatus::InTransit => &mut self.transit,
            OrderStatus::Cancelled => &mut self.cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub quantity: i64,
    /// Distinct products moved.
    pub type_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockCounts {
    #[serde(rename = "stock-in")]
    pub stock_in: StockMovement,
    #[serde(rename = "stock-out")]
    pub stock_out: StockMovement,
}

/// Units moved for one product under one action within the queried window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductMovement {
    pub action: HistoryAction,
    pub product_id: Uuid,
    pub quantity: i64,
}

impl StockCounts {
    /// Fold per-product movement totals. Each `(action, product)` pair is
    /// expected once; actions other than stock-in and stock-out are ignored.
    pub fn from_movements(movements: impl IntoIterator<Item = ProductMovement>) -> Self {
        movements
            .into_iter()
            .fold(Self::default(), |mut counts, movement| {
                let slot = match movement.action {
                    HistoryAction::StockIn => &mut counts.stock_in,
                    HistoryAction::StockOut => &mut counts.stock_out,
                    _ => return counts,
                };
                slot.quantity += movement.quantity.abs();
                slot.type_count += 1;
                counts
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_product_types: u64,
    pub total_products: i64,
    pub low_stock_product_types: u64,
    pub orders: OrderStatusCounts,
    pub stock_counts: StockCounts,
}

impl DashboardData {
    pub fn new(stock: StockSummary, orders: OrderStatusCounts, stock_counts: StockCounts) -> Self {
        Self {
            total_product_types: stock.product_types,
            total_products: stock.total_units,
            low_stock_product_types: stock.low_stock_types,
            orders,
            stock_counts,
        }
    }
}
