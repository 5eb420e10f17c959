//! Catalog handlers. Every route is admin only.

use axum::{extract::State, response::Json, routing::post, Extension, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{NewProduct, Product, ProductChanges};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Green tea")]
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(alias = "stockLevel")]
    #[validate(range(min = 0, message = "Stock must be zero or positive"))]
    pub stock_number: i32,
    #[validate(range(min = 0.0, message = "Price must be zero or positive"))]
    pub price: f64,
    #[validate(range(min = 0, message = "Low stock threshold must be zero or positive"))]
    pub low_stock_threshold: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub id: Uuid,
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub low_stock_threshold: Option<i32>,
}

/// Manual stock override.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    pub id: Uuid,
    #[schema(example = 25)]
    pub new_stock: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductIdRequest {
    pub id: Uuid,
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/getAllProduct", post(list_products))
        .route("/addNewProduct", post(create_product))
        .route("/updateProduct", post(update_product))
        .route("/updateStock", post(update_stock))
        .route("/deleteProduct", post(delete_product))
}

#[utoipa::path(
    post,
    path = "/product/getAllProduct",
    tag = "Products",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Every product", body = Vec<Product>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Product>>> {
    require_admin(&user)?;
    Ok(Json(state.services.products().list_products().await?))
}

#[utoipa::path(
    post,
    path = "/product/addNewProduct",
    tag = "Products",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 404, description = "Category not found")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<Created<Product>> {
    require_admin(&user)?;

    let product = state
        .services
        .products()
        .create_product(
            &user,
            NewProduct {
                name: payload.name,
                category_id: payload.category_id,
                description: payload.description,
                image: payload.image,
                stock_number: payload.stock_number,
                price: payload.price,
                low_stock_threshold: payload.low_stock_threshold,
            },
        )
        .await?;

    Ok(Created(product))
}

#[utoipa::path(
    post,
    path = "/product/updateProduct",
    tag = "Products",
    security(("bearer_auth" = [])),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Product or category not found")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    require_admin(&user)?;

    let product = state
        .services
        .products()
        .update_product(
            &user,
            payload.id,
            ProductChanges {
                name: payload.name,
                category_id: payload.category_id,
                description: payload.description,
                image: payload.image,
                price: payload.price,
                low_stock_threshold: payload.low_stock_threshold,
            },
        )
        .await?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/product/updateStock",
    tag = "Products",
    security(("bearer_auth" = [])),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Stock replaced", body = Product),
        (status = 400, description = "Negative stock"),
        (status = 409, description = "Stock changed concurrently")
    )
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateStockRequest>,
) -> AppResult<Json<Product>> {
    require_admin(&user)?;

    let product = state
        .services
        .products()
        .update_stock(&user, payload.id, payload.new_stock)
        .await?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/product/deleteProduct",
    tag = "Products",
    security(("bearer_auth" = [])),
    request_body = ProductIdRequest,
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ProductIdRequest>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&user)?;

    state
        .services
        .products()
        .delete_product(&user, payload.id)
        .await?;

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
