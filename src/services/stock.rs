//! Stock mutation through compare-and-swap.
//!
//! Every write re-reads the product and only succeeds if nobody changed
//! the stock in between. Lost races are retried a bounded number of times.

use uuid::Uuid;

use crate::config::MAX_STOCK_UPDATE_ATTEMPTS;
use crate::domain::{Product, StockChange};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::ProductRepository;

/// Replace a product's stock with the value `next` derives from the
/// freshly read product.
pub(crate) async fn update_stock_with<F>(
    products: &dyn ProductRepository,
    product_id: Uuid,
    next: F,
) -> AppResult<StockChange>
where
    F: Fn(&Product) -> AppResult<i32> + Send + Sync,
{
    for attempt in 1..=MAX_STOCK_UPDATE_ATTEMPTS {
        let product = products
            .find_by_id(product_id)
            .await?
            .ok_or_not_found("Product")?;
        let new_stock = next(&product)?;

        if products
            .compare_and_set_stock(product_id, product.stock_number, new_stock)
            .await?
        {
            return Ok(StockChange {
                before: product,
                new_stock,
            });
        }

        tracing::debug!(%product_id, attempt, "Stock changed concurrently, retrying");
    }

    tracing::warn!(%product_id, "Giving up on contended stock update");
    Err(AppError::Concurrency(
        "Stock was modified concurrently, please retry".to_string(),
    ))
}

/// Add `delta` (negative to remove). Never takes stock below zero or past
/// `i32::MAX`.
pub(crate) async fn adjust_stock(
    products: &dyn ProductRepository,
    product_id: Uuid,
    delta: i32,
) -> AppResult<StockChange> {
    update_stock_with(products, product_id, |product| {
        let new_stock = product.stock_number.checked_add(delta).ok_or_else(|| {
            AppError::bad_request(format!("Stock for {} is out of range", product.name))
        })?;
        if new_stock < 0 {
            return Err(insufficient_stock(product));
        }
        Ok(new_stock)
    })
    .await
}

pub(crate) fn insufficient_stock(product: &Product) -> AppError {
    AppError::bad_request(format!("Insufficient stock for {}", product.name))
}
