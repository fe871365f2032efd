use std::sync::Arc;

use argon2::password_hash;
use thiserror::Error;
use tracing::info;

use signup_db::{Database, DbError};

use crate::password::hash_password;

/// Input that already passed [`crate::validation::Validator`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The store's unique constraint rejected the email. Happens when a
    /// concurrent registration wins the race after the pre-check.
    #[error("email already in use")]
    DuplicateEmail,

    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    #[error(transparent)]
    Storage(DbError),

    #[error("registration task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<DbError> for RegistrationError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateEmail => RegistrationError::DuplicateEmail,
            other => RegistrationError::Storage(other),
        }
    }
}

pub struct RegistrationService {
    db: Arc<Database>,
}

impl RegistrationService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Hashes the password and inserts the user. Returns the new id.
    pub async fn register(&self, user: NewUser) -> Result<i64, RegistrationError> {
        let NewUser {
            username,
            email,
            password,
        } = user;

        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await?
            .map_err(RegistrationError::Hash)?;

        let db = self.db.clone();
        let id = tokio::task::spawn_blocking(move || {
            let id = db.insert_user(&username, &email, &password_hash)?;
            info!(user_id = id, %username, "User registered");
            Ok::<_, DbError>(id)
        })
        .await??;

        Ok(id)
    }
}
