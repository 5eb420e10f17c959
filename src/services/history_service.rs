use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::History;
use crate::errors::AppResult;
use crate::infra::UnitOfWork;
use crate::types::DateRange;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Read-only view of the audit trail.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn list_histories(&self, range: DateRange) -> AppResult<Vec<History>>;
}

pub struct HistoryReader<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> HistoryReader<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> HistoryService for HistoryReader<U> {
    async fn list_histories(&self, range: DateRange) -> AppResult<Vec<History>> {
        self.uow.histories().list(range).await
    }
}
