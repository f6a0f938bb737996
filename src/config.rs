use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Which backing store the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl StoreKind {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreKind::Postgres),
            "memory" | "mem" => Ok(StoreKind::Memory),
            other => anyhow::bail!("unknown STORE value {other:?}, expected postgres or memory"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    pub default_size: u64,
    pub max_size: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// How often the Postgres store re-checks reachability for the 503 gate.
    pub ping_interval: Duration,
    pub paging: PageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::Memory,
            database_url: None,
            max_connections: 10,
            ping_interval: Duration::from_secs(5),
            paging: PageConfig {
                default_size: 20,
                max_size: 100,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE") {
            Ok(v) => StoreKind::parse(&v)?,
            Err(_) => StoreKind::Postgres,
        };
        let database_url = match store {
            StoreKind::Postgres => Some(
                std::env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set when STORE=postgres")?,
            ),
            StoreKind::Memory => std::env::var("DATABASE_URL").ok(),
        };
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let ping_interval = std::env::var("DB_PING_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));
        let max_size = std::env::var("MAX_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(100);
        let default_size = std::env::var("PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(20)
            .min(max_size);

        Ok(Self {
            store,
            database_url,
            max_connections,
            ping_interval,
            paging: PageConfig {
                default_size,
                max_size,
            },
        })
    }
}
