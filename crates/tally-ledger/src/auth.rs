//! # Authentication
//!
//! Username/password login against Argon2 PHC hashes, and user maintenance.
//!
//! A failed login never says whether the username or the password was
//! wrong. The result of a successful login is an [`ActingUser`] that the
//! caller passes explicitly to checkout and payment recording.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use tally_core::validation::{validate_password, validate_username};
use tally_core::{ActingUser, CoreError, User, UserRole};
use tally_db::repository::user::generate_user_id;
use tally_db::Database;

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> LedgerResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| LedgerError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string.
///
/// A malformed hash verifies as `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Login and user administration.
#[derive(Debug, Clone)]
pub struct Authenticator {
    db: Database,
}

impl Authenticator {
    /// Creates a new Authenticator.
    pub fn new(db: Database) -> Self {
        Authenticator { db }
    }

    /// Verifies credentials.
    ///
    /// ## Returns
    /// * `Ok(ActingUser)` - Credentials match
    /// * `Err(UNAUTHORIZED)` - Unknown username or wrong password
    pub async fn login(&self, username: &str, password: &str) -> LedgerResult<ActingUser> {
        let user = self.db.users().get_by_username(username.trim()).await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => {
                info!(user_id = %user.id, username = %user.username, "Login succeeded");
                Ok(ActingUser::from(&user))
            }
            _ => {
                warn!(username = %username, "Login failed");
                Err(CoreError::InvalidCredentials.into())
            }
        }
    }

    /// Creates a user with a hashed password.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> LedgerResult<User> {
        validate_username(username).map_err(CoreError::from)?;
        validate_password(password).map_err(CoreError::from)?;

        let user = User {
            id: generate_user_id(),
            username: username.trim().to_string(),
            password_hash: hash_password(password)?,
            role,
            created_at: Utc::now(),
        };

        let user = self.db.users().insert(&user).await?;
        info!(user_id = %user.id, username = %user.username, role = ?role, "User created");

        Ok(user)
    }

    /// Replaces a user's password.
    pub async fn change_password(&self, user_id: &str, new_password: &str) -> LedgerResult<()> {
        validate_password(new_password).map_err(CoreError::from)?;

        let hash = hash_password(new_password)?;
        self.db.users().update_password_hash(user_id, &hash).await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Changes a user's role.
    pub async fn change_role(&self, user_id: &str, role: UserRole) -> LedgerResult<()> {
        self.db.users().update_role(user_id, role).await?;
        info!(user_id = %user_id, role = ?role, "Role changed");
        Ok(())
    }

    /// Deletes a user that has no invoices.
    pub async fn delete_user(&self, user_id: &str) -> LedgerResult<()> {
        self.db.users().delete(user_id).await?;
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Gets a user by username.
    pub async fn user_by_username(&self, username: &str) -> LedgerResult<User> {
        self.db
            .users()
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| LedgerError::not_found("User", username))
    }

    /// Lists users by username.
    pub async fn list_users(&self) -> LedgerResult<Vec<User>> {
        debug!("list_users");
        Ok(self.db.users().list().await?)
    }
}
