use std::sync::Arc;

use crate::config::{AppConfig, StoreKind};
use crate::store::{IdentityStore, MemoryStore, PgStore, PostStore, Readiness};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn IdentityStore>,
    pub posts: Arc<dyn PostStore>,
    pub readiness: Arc<dyn Readiness>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let state = match config.store {
            StoreKind::Postgres => {
                let store = PgStore::connect(&config).await?;
                Self::from_store(store, config)
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Self::from_store(MemoryStore::new(), config)
            }
        };
        Ok(state)
    }

    pub fn from_store<S>(store: S, config: AppConfig) -> Self
    where
        S: IdentityStore + PostStore + Readiness + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            posts: store.clone(),
            readiness: store,
            config: Arc::new(config),
        }
    }

    /// State over a `MemoryStore` with default config. Keep a clone of the
    /// store to poke at it afterwards.
    pub fn in_memory(store: MemoryStore) -> Self {
        Self::from_store(store, AppConfig::default())
    }
}
