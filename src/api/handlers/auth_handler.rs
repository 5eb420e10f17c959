//! Account handlers: registration, login, profile and user administration.

use axum::{extract::State, response::Json, routing::post, Extension, Router};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, require_staff, CurrentUser};
use crate::api::AppState;
use crate::domain::{UserChanges, UserResponse, UserRole, UserStatus};
use crate::errors::AppResult;
use crate::services::{AuthSession, Registration, TokenResponse};
use crate::types::{Created, MessageResponse};

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{10}$").expect("phone pattern is a valid regex"));

/// Account registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(regex(path = *PHONE_PATTERN, message = "Phone number must be 10 digits"))]
    #[schema(example = "0123456789")]
    pub phone: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret1", min_length = 6)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile fields the account owner may change.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_PATTERN, message = "Phone number must be 10 digits"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// Administrative account edit.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub id: Uuid,
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_PATTERN, message = "Phone number must be 10 digits"))]
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// Current account, a fresh token and the number of orders waiting on
/// the caller's role.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub token: TokenResponse,
    pub count: u64,
}

/// Public routes: registration and login.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes that need an authenticated caller.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", post(get_profile).get(get_profile))
        .route("/updateProfile", post(update_profile))
        .route("/updatePassword", post(update_password))
        .route("/getAllUsers", post(list_users))
        .route("/updateUser", post(update_user))
}

/// Register a new client account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error or user already exists")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<UserResponse>> {
    let user = state
        .services
        .auth()
        .register(Registration {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
        })
        .await?;

    Ok(Created(UserResponse::from(user)))
}

/// Login and get a JWT
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthSession),
        (status = 401, description = "Invalid credentials or unverified account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthSession>> {
    let session = state
        .services
        .auth()
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/auth/profile",
    tag = "Account",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<ProfileResponse>> {
    let token = state.services.auth().issue_token(&user)?;
    let count = state.services.orders().awaiting_count(&user).await?;

    Ok(Json(ProfileResponse {
        user: UserResponse::from(user),
        token,
        count,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/updateProfile",
    tag = "Account",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error or duplicate email/phone")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let updated = state
        .services
        .users()
        .update_profile(
            user.id,
            UserChanges {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/auth/updatePassword",
    tag = "Account",
    security(("bearer_auth" = [])),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password is wrong")
    )
)]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdatePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .auth()
        .change_password(user.id, payload.current_password, payload.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password updated")))
}

#[utoipa::path(
    post,
    path = "/auth/getAllUsers",
    tag = "Account",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = Vec<UserResponse>),
        (status = 403, description = "Clients may not list accounts")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<UserResponse>>> {
    require_staff(&user)?;

    let users = state.services.users().list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/auth/updateUser",
    tag = "Account",
    security(("bearer_auth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&user)?;

    let updated = state
        .services
        .users()
        .update_user(
            payload.id,
            UserChanges {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
                role: payload.role,
                status: payload.status,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}
