//! CLI command implementations

pub mod activate;
pub mod config;
pub mod fetch;
pub mod install;
pub mod message;
pub mod purge;
pub mod status;
pub mod upgrade;

pub use activate::execute as activate;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use message::execute as message;
pub use purge::execute as purge;
pub use status::execute as status;
pub use upgrade::execute as upgrade;

use crate::config::{Config, ConfigManager};
use crate::error::{BundleError, BundleResult};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::manifest::Bundle;
use crate::store::{CacheStorage, DiskStorage};
use crate::worker::{Worker, WorkerConfig, WorkerState};
use std::sync::Arc;
use tracing::debug;

/// Everything a worker needs, built from configuration
pub(crate) struct Host {
    pub config: Arc<WorkerConfig>,
    pub storage: Arc<dyn CacheStorage>,
    pub fetcher: Arc<dyn Fetcher>,
}

impl Host {
    /// Load the bundle descriptor and open the disk stores
    pub async fn load(config: &Config) -> BundleResult<Self> {
        let origin = config
            .app
            .origin
            .as_deref()
            .ok_or(BundleError::OriginMissing)?;
        let bundle_path = config.app.bundle.as_ref().ok_or(BundleError::BundleMissing)?;

        let bundle = Bundle::from_file(bundle_path).await?;
        let worker_config =
            WorkerConfig::with_stores(origin, bundle, config.stores.names.clone())?;

        debug!(
            "Loaded bundle {} ({} resources, {} shell files)",
            bundle_path.display(),
            worker_config.bundle.resources.len(),
            worker_config.bundle.shell.len()
        );

        Ok(Self {
            config: Arc::new(worker_config),
            storage: open_storage(config),
            fetcher: Arc::new(HttpFetcher::new(&config.network)),
        })
    }

    /// A worker resumed at `state`
    pub fn worker(&self, state: WorkerState) -> Worker {
        Worker::restore(
            self.config.clone(),
            self.storage.clone(),
            self.fetcher.clone(),
            state,
        )
    }
}

/// Disk storage rooted at the configured store directory
pub(crate) fn open_storage(config: &Config) -> Arc<dyn CacheStorage> {
    let root = ConfigManager::stores_dir(config);
    debug!("Using stores at {}", root.display());
    Arc::new(DiskStorage::new(root))
}
