use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use super::Readiness;
use crate::config::AppConfig;

/// Postgres-backed store. The `IdentityStore` and `PostStore` impls live next
/// to their record types in `auth::repo` and `posts::repo`.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) db: PgPool,
    reachable: Arc<AtomicBool>,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL is not configured")?;
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.ping_interval)
            .connect(url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            warn!(error = %e, "migration failed; continuing");
        }

        let store = Self::from_pool(db);
        store.ping().await;
        store.spawn_pinger(config.ping_interval);
        Ok(store)
    }

    /// Starts out not ready until the first successful [`Self::ping`].
    pub fn from_pool(db: PgPool) -> Self {
        Self {
            db,
            reachable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Round-trips `SELECT 1` and records the outcome for [`Readiness::ready`].
    pub async fn ping(&self) -> bool {
        let ok = match sqlx::query("SELECT 1").execute(&self.db).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "database ping failed");
                false
            }
        };
        let was = self.reachable.swap(ok, Ordering::SeqCst);
        if was != ok {
            info!(reachable = ok, "database reachability changed");
        }
        ok
    }

    fn spawn_pinger(&self, every: Duration) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if store.db.is_closed() {
                    break;
                }
                store.ping().await;
            }
        });
    }
}

impl Readiness for PgStore {
    /// Result of the latest ping; false once the pool is closed.
    fn ready(&self) -> bool {
        !self.db.is_closed() && self.reachable.load(Ordering::SeqCst)
    }
}
