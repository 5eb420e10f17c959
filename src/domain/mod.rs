//! Domain layer - business entities and the pure rules over them.
//!
//! Nothing here touches the database or the network.

pub mod category;
pub mod dashboard;
pub mod history;
pub mod order;
pub mod password;
pub mod product;
pub mod user;

pub use category::{Category, CategoryChanges};
pub use dashboard::{DashboardData, OrderStatusCounts, ProductMovement, StockCounts, StockMovement};
pub use history::{History, HistoryAction, HistoryDetails, NewHistory, StockSnapshot};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderResponse, OrderStatus, StatusChange,
};
pub use password::Password;
pub use product::{NewProduct, Product, ProductChanges, StockChange, StockSummary};
pub use user::{NewUser, User, UserChanges, UserResponse, UserRole, UserStatus};
