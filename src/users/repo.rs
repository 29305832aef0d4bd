use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::ConnectionHandle;
use crate::users::error::StoreError;
use crate::users::repo_types::{NewUser, UserRecord};

/// Document-store operations the credential store depends on.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users in insertion order.
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
    /// Persist a new user. Fails with `UsernameTaken` on a duplicate username.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;
    /// `id` is the raw identifier from the caller; a malformed one is a `Lookup` error.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
}

pub(crate) fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id.trim()).map_err(|e| StoreError::Lookup(format!("{id}: {e}")))
}

/// Postgres-backed store reading through the bootstrapped connection.
#[derive(Clone)]
pub struct PgUserStore {
    conn: ConnectionHandle,
    op_timeout: Duration,
}

impl PgUserStore {
    pub fn new(conn: ConnectionHandle, op_timeout: Duration) -> Self {
        Self { conn, op_timeout }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.op_timeout.as_millis() as u64, "store operation timed out");
                Err(StoreError::Unavailable(format!("{op} timed out")))
            }
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let db = self.conn.pool()?;
        self.bounded("list", async {
            sqlx::query_as::<_, UserRecord>(
                r#"
                SELECT id, username, password_hash, email, created_at
                FROM users
                ORDER BY created_at ASC
                "#,
            )
            .fetch_all(db)
            .await
            .map_err(StoreError::read)
        })
        .await
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let db = self.conn.pool()?;
        let record = user.into_record();
        self.bounded("insert", async {
            sqlx::query_as::<_, UserRecord>(
                r#"
                INSERT INTO users (id, username, password_hash, email, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, username, password_hash, email, created_at
                "#,
            )
            .bind(record.id)
            .bind(&record.username)
            .bind(&record.password_hash)
            .bind(&record.email)
            .bind(record.created_at)
            .fetch_one(db)
            .await
            .map_err(|e| StoreError::write(e, &record.username))
        })
        .await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let db = self.conn.pool()?;
        self.bounded("find_by_username", async {
            sqlx::query_as::<_, UserRecord>(
                r#"
                SELECT id, username, password_hash, email, created_at
                FROM users
                WHERE username = $1
                "#,
            )
            .bind(username)
            .fetch_optional(db)
            .await
            .map_err(StoreError::read)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let id = parse_id(id)?;
        let db = self.conn.pool()?;
        self.bounded("find_by_id", async {
            sqlx::query_as::<_, UserRecord>(
                r#"
                SELECT id, username, password_hash, email, created_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(db)
            .await
            .map_err(StoreError::read)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconnected_store() -> PgUserStore {
        PgUserStore::new(
            ConnectionHandle::new("postgres://nowhere/db"),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn operations_fail_unavailable_before_connect() {
        let store = unconnected_store();
        assert!(matches!(store.list().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.find_by_username("alice").await,
            Err(StoreError::Unavailable(_))
        ));
        let new_user = NewUser {
            username: "alice".into(),
            password_hash: "h".into(),
            email: None,
        };
        assert!(matches!(store.insert(new_user).await, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn malformed_id_is_lookup_error_even_without_connection() {
        let store = unconnected_store();
        let err = store.find_by_id("not-a-uuid").await.unwrap_err();
        assert!(matches!(err, StoreError::Lookup(_)));
    }

    #[tokio::test]
    async fn expired_operation_is_unavailable() {
        let store = unconnected_store();
        let err = store
            .bounded("stall", std::future::pending::<Result<(), StoreError>>())
            .await
            .unwrap_err();
        match err {
            StoreError::Unavailable(msg) => assert_eq!(msg, "stall timed out"),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn completed_operation_passes_through() {
        let store = unconnected_store();
        let value = store.bounded("quick", async { Ok::<_, StoreError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
