//! OpenAPI documentation served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, category_handler, dashboard_handler, history_handler, order_handler,
    product_handler,
};
use crate::domain::{
    Category, DashboardData, History, HistoryAction, HistoryDetails, NewOrderItem, OrderItem,
    OrderResponse, OrderStatus, OrderStatusCounts, Product, StockCounts, StockMovement,
    StockSnapshot, UserResponse, UserRole, UserStatus,
};
use crate::services::{AuthSession, TokenResponse};
use crate::types::{DateRange, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = "Inventory and order management with realtime order events",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        auth_handler::get_profile,
        auth_handler::update_profile,
        auth_handler::update_password,
        auth_handler::list_users,
        auth_handler::update_user,
        product_handler::list_products,
        product_handler::create_product,
        product_handler::update_product,
        product_handler::update_stock,
        product_handler::delete_product,
        category_handler::list_categories,
        category_handler::create_category,
        category_handler::update_category,
        category_handler::delete_category,
        order_handler::list_orders,
        order_handler::create_order,
        order_handler::update_status,
        history_handler::list_histories,
        dashboard_handler::get_data,
    ),
    components(
        schemas(
            UserRole,
            UserStatus,
            UserResponse,
            TokenResponse,
            AuthSession,
            Product,
            Category,
            OrderStatus,
            OrderItem,
            NewOrderItem,
            OrderResponse,
            HistoryAction,
            StockSnapshot,
            HistoryDetails,
            History,
            StockMovement,
            StockCounts,
            OrderStatusCounts,
            DashboardData,
            DateRange,
            MessageResponse,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::UpdateProfileRequest,
            auth_handler::UpdatePasswordRequest,
            auth_handler::UpdateUserRequest,
            auth_handler::ProfileResponse,
            product_handler::CreateProductRequest,
            product_handler::UpdateProductRequest,
            product_handler::UpdateStockRequest,
            product_handler::ProductIdRequest,
            category_handler::CreateCategoryRequest,
            category_handler::UpdateCategoryRequest,
            order_handler::CreateOrderRequest,
            order_handler::UpdateStatusRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and login"),
        (name = "Account", description = "Profile and user administration"),
        (name = "Products", description = "Catalog and stock management"),
        (name = "Categories", description = "Product categories"),
        (name = "Orders", description = "Order placement and status"),
        (name = "History", description = "Audit trail"),
        (name = "Dashboard", description = "Aggregated figures")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` JWT scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
