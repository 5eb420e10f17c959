//! HTTP request handlers.

pub mod auth_handler;
pub mod category_handler;
pub mod dashboard_handler;
pub mod history_handler;
pub mod order_handler;
pub mod product_handler;
pub mod ws_handler;

pub use auth_handler::{account_routes, auth_routes};
pub use category_handler::category_routes;
pub use dashboard_handler::dashboard_routes;
pub use history_handler::history_routes;
pub use order_handler::order_routes;
pub use product_handler::product_routes;
pub use ws_handler::ws_routes;
