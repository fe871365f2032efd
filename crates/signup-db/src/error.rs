use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Insert rejected by the unique constraint on `users.email`.
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
