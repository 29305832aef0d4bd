use std::sync::{Arc, OnceLock};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::users::error::StoreError;

/// Used when neither an explicit address nor a configured one is available.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/cs480";

/// Picks the database address: explicit argument, then configuration, then
/// the local default.
pub fn resolve_address(explicit: Option<&str>, configured: Option<&str>) -> String {
    explicit
        .filter(|v| !v.trim().is_empty())
        .or(configured.filter(|v| !v.trim().is_empty()))
        .unwrap_or(DEFAULT_DATABASE_URL)
        .to_string()
}

/// Shared handle to the database connection.
///
/// The pool is filled in once by the bootstrap task. Until then every caller
/// sees `StoreError::Unavailable`, which is a valid operating state.
#[derive(Clone)]
pub struct ConnectionHandle {
    address: Arc<str>,
    pool: Arc<OnceLock<PgPool>>,
}

impl ConnectionHandle {
    pub fn new(address: impl Into<Arc<str>>) -> Self {
        Self {
            address: address.into(),
            pool: Arc::new(OnceLock::new()),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_ready(&self) -> bool {
        self.pool.get().is_some()
    }

    pub fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool
            .get()
            .ok_or_else(|| StoreError::Unavailable(format!("no connection to {}", self.address)))
    }

    /// Returns false if a pool was already installed.
    fn install(&self, pool: PgPool) -> bool {
        self.pool.set(pool).is_ok()
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            tracing::info!(address = %self.address, "database connection closed");
        }
    }
}

/// Starts connecting to the database and returns immediately.
///
/// Success and failure are only reported through logs; a failed attempt
/// leaves the handle unready and is not retried.
pub fn connect(explicit: Option<&str>, config: &AppConfig) -> ConnectionHandle {
    let address = resolve_address(explicit, config.database_url.as_deref());
    if explicit.is_none() && config.database_url.is_none() {
        tracing::warn!(
            address = %address,
            "no database address configured; falling back to local default"
        );
    }

    let handle = ConnectionHandle::new(address);
    let task_handle = handle.clone();
    let max_connections = config.max_connections;
    let acquire_timeout = config.op_timeout;
    let run_migrations = config.run_migrations;

    tokio::spawn(async move {
        let address = task_handle.address().to_string();
        let result = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(&address)
            .await;

        match result {
            Ok(pool) => {
                tracing::info!(address = %address, "database running at {}", address);
                if run_migrations {
                    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                        tracing::warn!(error = %e, "migration failed; continuing");
                    }
                }
                if !task_handle.install(pool) {
                    tracing::warn!(address = %address, "connection already installed");
                }
            }
            Err(e) => {
                tracing::error!(address = %address, error = %e, "database failed to run at {}", address);
            }
        }
    });

    handle
}
