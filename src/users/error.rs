use thiserror::Error;

/// Failures raised by a `UserStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live connection, or the operation timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store read failed: {0}")]
    Read(String),

    #[error("store write failed: {0}")]
    Write(String),

    /// The identifier is not in a shape the store can look up.
    #[error("malformed user id: {0}")]
    Lookup(String),

    #[error("username already taken: {0}")]
    UsernameTaken(String),
}

impl StoreError {
    pub(crate) fn read(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(e.to_string())
            }
            other => Self::Read(other.to_string()),
        }
    }

    pub(crate) fn write(e: sqlx::Error, username: &str) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Self::UsernameTaken(username.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(e.to_string())
            }
            other => Self::Write(other.to_string()),
        }
    }
}

/// Failures raised by the credential store.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
