//! Bearer token authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::User;
use crate::errors::AppError;

/// The authenticated account, re-read from storage for this request.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Resolve the bearer token to a user and insert [`CurrentUser`] into the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let user = state.services.auth().authenticate(token).await?;
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Require admin role, returns Forbidden error if not admin.
pub fn require_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Anyone but a client: admins, delivery staff and plain users.
pub fn require_staff(user: &User) -> Result<(), AppError> {
    if user.is_client() {
        Err(AppError::Forbidden)
    } else {
        Ok(())
    }
}
