//! Authentication: registration, login, token issuance and verification.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{NewUser, Password, User, UserResponse, UserRole, UserStatus};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// JWT claims payload. Only the user id is carried; role and status are
/// re-read on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Lifetime in seconds
    #[schema(example = 604800)]
    pub expires_in: i64,
}

/// Successful login: the account plus a fresh token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthSession {
    pub user: UserResponse,
    pub token: TokenResponse,
}

/// Account fields submitted at sign-up.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a verified client account.
    async fn register(&self, registration: Registration) -> AppResult<User>;

    async fn login(&self, email: String, password: String) -> AppResult<AuthSession>;

    /// Resolve a bearer token to the current state of its user.
    async fn authenticate(&self, token: &str) -> AppResult<User>;

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: String,
        new_password: String,
    ) -> AppResult<()>;

    fn issue_token(&self, user: &User) -> AppResult<TokenResponse>;

    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let email = normalize_email(&registration.email);

        if self.uow.users().find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("User"));
        }

        let password_hash = Password::new(&registration.password)?.into_string();
        let user = self
            .uow
            .users()
            .create(NewUser {
                name: registration.name.trim().to_string(),
                email,
                phone: registration.phone,
                password_hash,
                role: UserRole::Client,
                status: UserStatus::Verify,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<AuthSession> {
        let user = self.uow.users().find_by_email(&normalize_email(&email)).await?;

        let password_valid =
            Password::check_login(user.as_ref().map(|u| u.password_hash.as_str()), &password);

        let user = match user {
            Some(user) if password_valid => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        if !user.is_verified() {
            return Err(AppError::Unverified);
        }

        let token = generate_token(&user, &self.config)?;
        tracing::debug!(user_id = %user.id, "User logged in");

        Ok(AuthSession {
            user: UserResponse::from(user),
            token,
        })
    }

    async fn authenticate(&self, token: &str) -> AppResult<User> {
        let claims = self.verify_token(token)?;

        self.uow
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: String,
        new_password: String,
    ) -> AppResult<()> {
        let user = self
            .uow
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_not_found("User")?;

        if !Password::from_hash(user.password_hash).verify(&current_password) {
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = Password::new(&new_password)?.into_string();
        self.uow.users().set_password(user_id, password_hash).await
    }

    fn issue_token(&self, user: &User) -> AppResult<TokenResponse> {
        generate_token(user, &self.config)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, test_user, MockRepositories};

    fn service(repos: MockRepositories) -> Authenticator<crate::test_utils::TestUnitOfWork> {
        Authenticator::new(repos.into_unit_of_work(), test_config())
    }

    fn with_password(role: UserRole, status: UserStatus, password: &str) -> User {
        let mut user = test_user(role);
        user.status = status;
        user.password_hash = Password::new(password).unwrap().into_string();
        user
    }

    #[tokio::test]
    async fn test_register_rejects_existing_email() {
        let mut repos = MockRepositories::default();
        repos
            .users
            .expect_find_by_email()
            .withf(|email| email == "jane@example.com")
            .returning(|_| Ok(Some(test_user(UserRole::Client))));
        repos.users.expect_create().never();

        let err = service(repos)
            .register(Registration {
                name: "Jane".into(),
                email: " Jane@Example.com ".into(),
                phone: "0123456789".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.user_message(), "User already exists");
    }

    #[tokio::test]
    async fn test_register_creates_verified_client() {
        let mut repos = MockRepositories::default();
        repos.users.expect_find_by_email().returning(|_| Ok(None));
        repos
            .users
            .expect_create()
            .withf(|new_user| {
                new_user.role == UserRole::Client
                    && new_user.status == UserStatus::Verify
                    && new_user.email == "jane@example.com"
                    && new_user.password_hash.starts_with("$argon2")
            })
            .returning(|new_user| {
                let mut user = test_user(new_user.role);
                user.email = new_user.email;
                Ok(user)
            });

        let user = service(repos)
            .register(Registration {
                name: "Jane".into(),
                email: "JANE@example.com".into(),
                phone: "0123456789".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();

        assert_eq!(user.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_login_same_error_for_unknown_email_and_wrong_password() {
        let mut repos = MockRepositories::default();
        repos.users.expect_find_by_email().returning(|email| {
            if email == "known@example.com" {
                Ok(Some(with_password(UserRole::Client, UserStatus::Verify, "right-password")))
            } else {
                Ok(None)
            }
        });
        let auth = service(repos);

        let unknown = auth
            .login("nobody@example.com".into(), "whatever".into())
            .await
            .unwrap_err();
        let wrong = auth
            .login("known@example.com".into(), "wrong-password".into())
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status(), wrong.status());
        assert!(matches!(unknown, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_rejects_unverified_account() {
        let mut repos = MockRepositories::default();
        repos.users.expect_find_by_email().returning(|_| {
            Ok(Some(with_password(UserRole::Client, UserStatus::Unverify, "right-password")))
        });

        let err = service(repos)
            .login("known@example.com".into(), "right-password".into())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unverified));
    }

    #[tokio::test]
    async fn test_login_token_authenticates_same_user() {
        let user = with_password(UserRole::Deliver, UserStatus::Verify, "right-password");
        let user_id = user.id;
        let stored = user.clone();

        let mut repos = MockRepositories::default();
        repos
            .users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(stored.clone())));
        repos
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        let auth = service(repos);

        let session = auth
            .login("known@example.com".into(), "right-password".into())
            .await
            .unwrap();
        assert_eq!(session.token.token_type, "Bearer");

        let current = auth.authenticate(&session.token.access_token).await.unwrap();
        assert_eq!(current.id, user_id);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user_is_invalid_token() {
        let mut repos = MockRepositories::default();
        repos.users.expect_find_by_id().returning(|_| Ok(None));
        let auth = service(repos);

        let token = auth.issue_token(&test_user(UserRole::Admin)).unwrap();
        let err = auth.authenticate(&token.access_token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let auth = service(MockRepositories::default());
        let err = auth.authenticate("not-a-jwt").await.unwrap_err();
        assert_eq!(err.user_message(), "Token is not valid");
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let user = with_password(UserRole::Client, UserStatus::Verify, "old-password");
        let mut repos = MockRepositories::default();
        repos
            .users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        repos.users.expect_set_password().never();

        let err = service(repos)
            .change_password(Uuid::new_v4(), "not-it".into(), "new-password".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }
}
