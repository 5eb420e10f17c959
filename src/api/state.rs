//! Application state shared by every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database};
use crate::realtime::RealtimeHub;
use crate::services::{ServiceContainer, Services};

/// Cheap to clone: everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    pub realtime: Arc<RealtimeHub>,
    /// Present only when `REDIS_URL` is configured.
    pub cache: Option<Arc<Cache>>,
    /// Absent when the state is built over a non-database unit of work.
    pub database: Option<Arc<Database>>,
}

impl AppState {
    /// Build the full production state over a connected database.
    pub fn from_config(database: Arc<Database>, cache: Option<Arc<Cache>>, config: Config) -> Self {
        let services: Arc<dyn ServiceContainer> =
            Arc::new(Services::from_connection(database.get_connection(), config));

        Self {
            realtime: Arc::new(RealtimeHub::new(services.clone())),
            services,
            cache,
            database: Some(database),
        }
    }

    /// State over an arbitrary service container, without database or cache.
    pub fn new(services: Arc<dyn ServiceContainer>) -> Self {
        Self {
            realtime: Arc::new(RealtimeHub::new(services.clone())),
            services,
            cache: None,
            database: None,
        }
    }
}
