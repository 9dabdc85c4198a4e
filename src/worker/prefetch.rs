//! Shell prefetch, run once per install

use super::WorkerConfig;
use crate::error::{BundleError, BundleResult};
use crate::fetch::Fetcher;
use crate::http::{CacheMode, Request, Response};
use crate::keys;
use crate::store::CacheStorage;
use tracing::{debug, info};

/// Downloads the shell files into the staging store
pub struct ShellPrefetcher<'a> {
    config: &'a WorkerConfig,
    storage: &'a dyn CacheStorage,
    fetcher: &'a dyn Fetcher,
}

impl<'a> ShellPrefetcher<'a> {
    pub fn new(
        config: &'a WorkerConfig,
        storage: &'a dyn CacheStorage,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
        }
    }

    /// Prefetch every shell file, returning how many were staged
    pub async fn run(&self) -> BundleResult<usize> {
        self.run_with_progress(&|_, _, _| {}).await
    }

    /// Prefetch, calling `on_progress(done, total, path)` after each download
    ///
    /// Every file is fetched with [`CacheMode::Reload`]. Nothing is written
    /// to staging unless all fetches return an ok response.
    pub async fn run_with_progress(
        &self,
        on_progress: &(dyn Fn(usize, usize, &str) + Send + Sync),
    ) -> BundleResult<usize> {
        let shell = &self.config.bundle.shell;
        let total = shell.len();
        let staging = self.storage.open(&self.config.stores.staging).await?;

        let mut fetched: Vec<(String, Response)> = Vec::with_capacity(total);
        for path in shell.iter() {
            let url = keys::resolve(&self.config.origin, path);
            let request = Request::get(&url).with_cache_mode(CacheMode::Reload);

            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| BundleError::Prefetch {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;

            if !response.is_ok() {
                return Err(BundleError::Prefetch {
                    path: path.to_string(),
                    reason: format!("HTTP {}", response.status),
                });
            }

            debug!("Prefetched {} ({} bytes)", path, response.body.len());
            fetched.push((url, response));
            on_progress(fetched.len(), total, path);
        }

        for (url, response) in &fetched {
            staging.put(url, response).await?;
        }

        info!("Staged {} shell file(s) in {}", fetched.len(), staging.name());
        Ok(fetched.len())
    }
}
