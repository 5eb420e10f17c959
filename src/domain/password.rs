//! Account passwords. Only argon2 hashes are ever stored on a user row.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Verified against when a login names no known account.
static PLACEHOLDER_HASH: Lazy<Option<String>> = Lazy::new(|| {
    Password::new("placeholder-password")
        .map(Password::into_string)
        .ok()
});

/// A hashed account password.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a password chosen at registration, password change or admin
    /// bootstrap.
    ///
    /// # Errors
    /// Returns a validation error if the password has fewer than
    /// `MIN_PASSWORD_LENGTH` characters.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// Wrap the hash stored on a user row.
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// The hash to persist.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Malformed hashes never verify.
    pub fn verify(&self, plain_text: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// Check a login attempt against the account's stored hash, if any.
    /// An unknown account still costs one argon2 verification, so both
    /// failure paths take the same time.
    pub fn check_login(stored_hash: Option<&str>, plain_text: &str) -> bool {
        match stored_hash {
            Some(hash) => Self::from_hash(hash.to_string()).verify(plain_text),
            None => {
                if let Some(placeholder) = PLACEHOLDER_HASH.as_deref() {
                    Self::from_hash(placeholder.to_string()).verify(plain_text);
                }
                false
            }
        }
    }
}
