use std::time::Duration;

use anyhow::Context;

/// Which `UserStore` implementation backs the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown USER_STORE backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address from the configuration source, if any. The bootstrapper
    /// falls back to a local default when this is `None`.
    pub database_url: Option<String>,
    pub app_host: String,
    pub app_port: u16,
    pub max_connections: u32,
    pub op_timeout: Duration,
    pub run_migrations: bool,
    pub store: StoreBackend,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            app_host: "0.0.0.0".into(),
            app_port: 8080,
            max_connections: 10,
            op_timeout: Duration::from_millis(5000),
            run_migrations: true,
            store: StoreBackend::Postgres,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let app_host = lookup("APP_HOST").unwrap_or(defaults.app_host);
        let app_port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().context("parse APP_PORT")?,
            None => defaults.app_port,
        };
        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.max_connections);
        let op_timeout = lookup("DB_OP_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.op_timeout);
        let run_migrations = lookup("RUN_MIGRATIONS")
            .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
            .unwrap_or(defaults.run_migrations);
        let store = match lookup("USER_STORE") {
            Some(v) => v.parse()?,
            None => defaults.store,
        };

        Ok(Self {
            database_url,
            app_host,
            app_port,
            max_connections,
            op_timeout,
            run_migrations,
            store,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}
