use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use nommer_infra::{InMemoryProjectStore, PostgresProjectStore, ProjectRegistry, ProjectStore};

use crate::config::{ApiConfig, StoreBackend};

/// Registry over whichever store the process was configured with.
pub type Registry = ProjectRegistry<Arc<dyn ProjectStore>>;

const MAX_PG_CONNECTIONS: u32 = 10;

/// Application services shared by every handler.
pub struct AppServices {
    registry: Registry,
    // Kept so shutdown can close the pool; requests go through `registry`.
    postgres: Option<PostgresProjectStore>,
}

impl AppServices {
    /// In-memory registry, used by default and by the black-box tests.
    pub fn in_memory(store_timeout: Duration) -> Self {
        let store: Arc<dyn ProjectStore> = Arc::new(InMemoryProjectStore::new());
        Self {
            registry: ProjectRegistry::new(store).with_store_timeout(store_timeout),
            postgres: None,
        }
    }

    pub async fn build(config: &ApiConfig) -> anyhow::Result<Self> {
        match &config.store {
            StoreBackend::InMemory => {
                tracing::info!("using in-memory project store");
                Ok(Self::in_memory(config.store_timeout))
            }
            StoreBackend::Postgres { database_url } => {
                tracing::info!("using postgres project store");
                let pool = PgPoolOptions::new()
                    .max_connections(MAX_PG_CONNECTIONS)
                    .acquire_timeout(config.store_timeout)
                    .connect(database_url)
                    .await?;

                let postgres = PostgresProjectStore::new(pool);
                postgres.ensure_schema().await?;

                let store: Arc<dyn ProjectStore> = Arc::new(postgres.clone());
                Ok(Self {
                    registry: ProjectRegistry::new(store).with_store_timeout(config.store_timeout),
                    postgres: Some(postgres),
                })
            }
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Release store connections. In-flight store calls fail as cancelled.
    pub async fn shutdown(&self) {
        if let Some(postgres) = &self.postgres {
            postgres.close().await;
            tracing::info!("postgres pool closed");
        }
    }
}
