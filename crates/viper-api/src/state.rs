//! Application state wiring configuration, storage and the generator.
//!
//! Core types are generic over their ports; AppState pins them to the
//! concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use viper_core::fleet::store::FleetStore;
use viper_core::router::ViewRouter;
use viper_infra::builder::LlmSpecGenerator;
use viper_infra::config::{load_config, resolve_data_dir};
use viper_infra::sqlite::pool::{DatabasePool, database_url};
use viper_infra::sqlite::slot::SqliteSlotStore;
use viper_types::config::ViperConfig;

pub type ConcreteFleet = FleetStore<SqliteSlotStore>;

pub type ConcreteRouter = ViewRouter<SqliteSlotStore>;

/// Shared application state used by every command.
#[derive(Clone)]
pub struct AppState {
    pub config: ViperConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    pub generator: Arc<LlmSpecGenerator>,
}

impl AppState {
    /// Resolve the data directory, load config, and open the database.
    ///
    /// The API key is not read here; a missing key only matters once a
    /// generation is attempted.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open the fleet database")?;

        let generator = Arc::new(LlmSpecGenerator::from_config(&config));

        tracing::debug!(data_dir = %data_dir.display(), model = %config.model, "app state ready");

        Ok(Self {
            config,
            data_dir,
            db_pool,
            generator,
        })
    }

    /// Open the fleet, loading persisted records.
    pub async fn open_fleet(&self) -> ConcreteFleet {
        FleetStore::open(
            SqliteSlotStore::new(self.db_pool.clone()),
            &self.config.storage,
        )
        .await
    }

    /// Router on the landing view over a freshly loaded fleet.
    pub async fn router(&self) -> ConcreteRouter {
        ViewRouter::new(self.open_fleet().await)
    }

    pub fn finalize_delay(&self) -> Duration {
        Duration::from_millis(self.config.builder.finalize_delay_ms)
    }
}
