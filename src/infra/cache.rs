//! Redis-backed request counters.
//!
//! Redis is optional; without it the rate limiter is switched off.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use crate::config::CACHE_PREFIX_RATE_LIMIT;
use crate::errors::{AppError, AppResult};

#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis connected");
        Ok(Self { connection })
    }

    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    /// Count one request against `identifier` in a fixed window.
    ///
    /// Returns the count so far and whether it is within `max_requests`.
    /// The window starts with the first request and is not extended by
    /// later ones.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = rate_limit_key(identifier);
        let mut conn = self.connection.clone();

        let count: i64 = conn.incr(&key, 1).await.map_err(cache_error)?;
        if count == 1 {
            let _: bool = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        let count = count.max(0) as u64;
        Ok((count, count <= max_requests))
    }

    pub async fn rate_limit_remaining(&self, identifier: &str, max_requests: u64) -> AppResult<u64> {
        let mut conn = self.connection.clone();
        let count: Option<i64> = conn
            .get(rate_limit_key(identifier))
            .await
            .map_err(cache_error)?;

        Ok(max_requests.saturating_sub(count.unwrap_or(0).max(0) as u64))
    }
}

fn rate_limit_key(identifier: &str) -> String {
    format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier)
}

fn cache_error(e: RedisError) -> AppError {
    tracing::error!(error = %e, "Redis error");
    AppError::internal(format!("Cache error: {}", e))
}
