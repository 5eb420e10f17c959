//! Order handlers. Role rules live in the order service; successful
//! writes are pushed to every realtime connection.

use axum::{extract::State, response::Json, routing::post, Extension, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{NewOrderItem, OrderResponse, OrderStatus, StatusChange};
use crate::errors::AppResult;
use crate::services::PlaceOrder;
use crate::types::{Created, DateRange};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Honoured for administrators only.
    pub client_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_id: Uuid,
    pub status: OrderStatus,
    #[validate(length(min = 1, message = "Delivery agent cannot be empty"))]
    pub delivery_agent: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/getAllOrders", post(list_orders))
        .route("/createOrder", post(create_order))
        .route("/updateStatus", post(update_status))
}

#[utoipa::path(
    post,
    path = "/order/getAllOrders",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = DateRange,
    responses((status = 200, description = "Orders visible to the caller, newest first", body = Vec<OrderResponse>))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(range): Json<DateRange>,
) -> AppResult<Json<Vec<OrderResponse>>> {
    Ok(Json(state.services.orders().list_orders(&user, range).await?))
}

#[utoipa::path(
    post,
    path = "/order/createOrder",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed and stock taken", body = OrderResponse),
        (status = 400, description = "Invalid items or insufficient stock"),
        (status = 404, description = "Product or client not found"),
        (status = 409, description = "Stock changed concurrently")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> AppResult<Created<OrderResponse>> {
    let order = state
        .services
        .orders()
        .create_order(
            &user,
            PlaceOrder {
                client_id: payload.client_id,
                items: payload.items,
            },
        )
        .await?;

    state.realtime.order_created(&order);
    Ok(Created(order))
}

#[utoipa::path(
    post,
    path = "/order/updateStatus",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 400, description = "Order already cancelled"),
        (status = 403, description = "Caller may not make this transition"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<OrderResponse>> {
    let order = state
        .services
        .orders()
        .update_status(
            &user,
            payload.order_id,
            StatusChange {
                status: payload.status,
                delivery_agent: payload.delivery_agent,
                delivery_date: payload.delivery_date,
            },
        )
        .await?;

    state.realtime.order_status_changed(&order);
    Ok(Json(order))
}
