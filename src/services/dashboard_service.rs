//! Dashboard figures, computed fresh on every call.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{DashboardData, OrderStatusCounts, StockCounts};
use crate::errors::AppResult;
use crate::infra::UnitOfWork;
use crate::types::DateRange;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DashboardService: Send + Sync {
    /// `range` only bounds the stock movement figures.
    async fn get_data(&self, range: DateRange) -> AppResult<DashboardData>;
}

pub struct DashboardAggregator<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> DashboardAggregator<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> DashboardService for DashboardAggregator<U> {
    async fn get_data(&self, range: DateRange) -> AppResult<DashboardData> {
        let products = self.uow.products();
        let orders = self.uow.orders();
        let histories = self.uow.histories();

        let (stock, status_counts, movements) = tokio::try_join!(
            products.stock_summary(),
            orders.count_by_status(),
            histories.stock_movements(range),
        )?;

        Ok(DashboardData::new(
            stock,
            OrderStatusCounts::from_counts(status_counts),
            StockCounts::from_movements(movements),
        ))
    }
}
