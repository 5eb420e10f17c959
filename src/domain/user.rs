//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    ROLE_ADMIN, ROLE_CLIENT, ROLE_DELIVER, ROLE_USER, STATUS_UNVERIFY, STATUS_VERIFY,
};

/// Coarse access class gating endpoint authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    #[serde(alias = "patient")]
    Client,
    #[serde(alias = "doctor", alias = "warehouse")]
    Deliver,
    User,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn is_client(&self) -> bool {
        matches!(self, UserRole::Client)
    }

    /// Roles allowed to move any order through its lifecycle
    pub fn manages_orders(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Deliver)
    }

    /// Parse a stored or submitted role, accepting legacy aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ROLE_ADMIN => Some(UserRole::Admin),
            ROLE_CLIENT | "patient" => Some(UserRole::Client),
            ROLE_DELIVER | "doctor" | "warehouse" => Some(UserRole::Deliver),
            ROLE_USER => Some(UserRole::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::Client => ROLE_CLIENT,
            UserRole::Deliver => ROLE_DELIVER,
            UserRole::User => ROLE_USER,
        }
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        Self::parse(s).unwrap_or(UserRole::User)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Verify,
    Unverify,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Verify => STATUS_VERIFY,
            UserStatus::Unverify => STATUS_UNVERIFY,
        }
    }
}

impl From<&str> for UserStatus {
    fn from(s: &str) -> Self {
        match s {
            STATUS_UNVERIFY => UserStatus::Unverify,
            _ => UserStatus::Verify,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_client(&self) -> bool {
        self.role.is_client()
    }

    pub fn is_verified(&self) -> bool {
        self.status == UserStatus::Verify
    }
}

/// Fields required to persist a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Partial update applied by an administrator or by the account owner.
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "0123456789")]
    pub phone: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}
