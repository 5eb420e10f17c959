use axum::{extract::State, response::Json, routing::post, Extension, Router};

use crate::api::middleware::{require_staff, CurrentUser};
use crate::api::AppState;
use crate::domain::DashboardData;
use crate::errors::AppResult;
use crate::types::DateRange;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/getData", post(get_data))
}

#[utoipa::path(
    post,
    path = "/dashboard/getData",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    request_body = DateRange,
    responses(
        (status = 200, description = "Stock and order figures", body = DashboardData),
        (status = 403, description = "Clients may not read the dashboard")
    )
)]
pub async fn get_data(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(range): Json<DateRange>,
) -> AppResult<Json<DashboardData>> {
    require_staff(&user)?;
    Ok(Json(state.services.dashboard().get_data(range).await?))
}
