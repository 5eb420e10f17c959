//! Audit trail handler.

use axum::{extract::State, response::Json, routing::post, Extension, Router};

use crate::api::middleware::{require_staff, CurrentUser};
use crate::api::AppState;
use crate::domain::History;
use crate::errors::AppResult;
use crate::types::DateRange;

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/getHistories", post(list_histories))
}

#[utoipa::path(
    post,
    path = "/history/getHistories",
    tag = "History",
    security(("bearer_auth" = [])),
    request_body = DateRange,
    responses(
        (status = 200, description = "History entries, newest first", body = Vec<History>),
        (status = 403, description = "Clients may not read history")
    )
)]
pub async fn list_histories(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(range): Json<DateRange>,
) -> AppResult<Json<Vec<History>>> {
    require_staff(&user)?;
    Ok(Json(state.services.histories().list_histories(range).await?))
}
