use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::db::{self, ConnectionHandle};
use crate::users::memory::MemoryUserStore;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::services::CredentialStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: CredentialStore,
    /// Present only for the Postgres backend.
    pub conn: Option<ConnectionHandle>,
}

impl AppState {
    /// Wires the configured store. The database connection is started in the
    /// background; this never waits for it.
    pub fn init(config: AppConfig, explicit_db: Option<&str>) -> Self {
        let config = Arc::new(config);

        match config.store {
            StoreBackend::Postgres => {
                let conn = db::connect(explicit_db, &config);
                let store =
                    Arc::new(PgUserStore::new(conn.clone(), config.op_timeout)) as Arc<dyn UserStore>;
                Self::from_parts(config, store, Some(conn))
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory user store; records are lost on exit");
                let store = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
                Self::from_parts(config, store, None)
            }
        }
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn UserStore>,
        conn: Option<ConnectionHandle>,
    ) -> Self {
        Self {
            config,
            users: CredentialStore::new(store),
            conn,
        }
    }

    /// State backed by an empty in-memory store.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            ..AppConfig::default()
        });
        let store = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
        Self::from_parts(config, store, None)
    }

    pub async fn shutdown(&self) {
        if let Some(conn) = &self.conn {
            conn.close().await;
        }
    }
}
