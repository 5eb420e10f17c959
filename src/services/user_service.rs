//! Account management for administrators and account owners.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::auth_service::normalize_email;
use crate::domain::{User, UserChanges};
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Administrative edit; may change role and status.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User>;

    /// Owner edit; role and status are ignored.
    async fn update_profile(&self, id: Uuid, changes: UserChanges) -> AppResult<User>;
}

pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

fn normalized(mut changes: UserChanges) -> UserChanges {
    changes.email = changes.email.as_deref().map(normalize_email);
    changes.name = changes.name.map(|name| name.trim().to_string());
    changes
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("User")
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.uow.users().list().await
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let user = self.uow.users().update(id, normalized(changes)).await?;
        tracing::info!(user_id = %id, role = %user.role, status = %user.status, "User updated");
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let changes = UserChanges {
            role: None,
            status: None,
            ..normalized(changes)
        };
        self.uow.users().update(id, changes).await
    }
}
