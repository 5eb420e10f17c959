//! Category handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{Category, CategoryChanges};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Beverages")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    pub id: Uuid,
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/getAllCategories", post(list_categories))
        .route("/addCategory", post(create_category))
        .route("/updateCategory", post(update_category))
        .route("/deleteCategory/:id", delete(delete_category))
}

#[utoipa::path(
    post,
    path = "/category/getAllCategories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Every category", body = Vec<Category>))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.services.categories().list_categories().await?))
}

#[utoipa::path(
    post,
    path = "/category/addCategory",
    tag = "Categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Name already exists")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> AppResult<Created<Category>> {
    require_admin(&user)?;

    let category = state
        .services
        .categories()
        .create_category(payload.name, payload.description)
        .await?;

    Ok(Created(category))
}

#[utoipa::path(
    post,
    path = "/category/updateCategory",
    tag = "Categories",
    security(("bearer_auth" = [])),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<Json<Category>> {
    require_admin(&user)?;

    let category = state
        .services
        .categories()
        .update_category(
            payload.id,
            CategoryChanges {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/category/deleteCategory/{id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&user)?;

    state.services.categories().delete_category(id).await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
