//! Admin command - bootstrap administrator accounts.

use crate::cli::args::{AdminAction, AdminArgs};
use crate::config::Config;
use crate::domain::{NewUser, Password, UserRole, UserStatus};
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, UserRepository, UserStore};
use crate::services::normalize_email;

pub async fn execute(args: AdminArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config).await?;
    let users = UserStore::new(db.get_connection());

    match args.action {
        AdminAction::Create {
            name,
            email,
            phone,
            password,
        } => {
            let email = normalize_email(&email);
            if users.find_by_email(&email).await?.is_some() {
                return Err(AppError::conflict("User"));
            }

            let user = users
                .create(NewUser {
                    name: name.trim().to_string(),
                    email,
                    phone,
                    password_hash: Password::new(&password)?.into_string(),
                    role: UserRole::Admin,
                    status: UserStatus::Verify,
                })
                .await?;

            tracing::info!(user_id = %user.id, email = %user.email, "Administrator created");
            println!("Created administrator {} ({})", user.email, user.id);
        }
    }

    Ok(())
}
