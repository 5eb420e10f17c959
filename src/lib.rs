//! Inventory API - inventory and order management backend.
//!
//! Accounts with roles, a product catalog with categories, orders that move
//! stock, an append-only audit history, a dashboard and realtime order
//! events over WebSocket.
//!
//! # Architecture Layers
//!
//! - **cli** / **commands**: command-line entry points
//! - **config**: environment configuration and constants
//! - **domain**: entities and value objects
//! - **services**: use cases behind traits
//! - **infra**: database, repositories, Redis cache
//! - **realtime**: WebSocket connection registry and message dispatch
//! - **api**: HTTP handlers, middleware and routes
//! - **types**: shared request/response types
//! - **errors**: centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! cargo run -- serve
//! cargo run -- migrate up
//! cargo run -- admin create --name Root --email root@example.com --phone 0123456789 --password secret1
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod realtime;
pub mod services;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use api::AppState;
pub use config::Config;
pub use domain::{Password, User, UserRole};
pub use errors::{AppError, AppResult};
pub use infra::Cache;
