//! Cache reconciliation, run once per activation
//!
//! Merges the staged shell files into the content store and drops content
//! whose fingerprint changed since the last activated version.
//!
//! # Outcomes
//!
//! | Prior record | Result |
//! |--------------|--------|
//! | none | cold start: content rebuilt from staging only |
//! | present | warm upgrade: unchanged entries kept, rest evicted, staging merged |
//! | any step fails | purge: content, staging and record deleted |
//!
//! A purge leaves no record behind, so the next activation is a cold start.

use super::plan::plan_evictions;
use super::WorkerConfig;
use crate::error::BundleResult;
use crate::http::Response;
use crate::keys;
use crate::manifest::ResourceManifest;
use crate::store::{CacheStorage, CacheStore};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Key of the manifest record inside the manifest store
pub const MANIFEST_RECORD_KEY: &str = "manifest";

/// What an activation did to the stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationOutcome {
    /// No prior record: content rebuilt from staging
    ColdStart { copied: usize },
    /// Prior record found: unchanged content retained
    WarmUpgrade {
        retained: usize,
        evicted: usize,
        copied: usize,
    },
    /// A step failed and every store was deleted
    Purged { reason: String },
}

impl ActivationOutcome {
    /// Whether the worker should take control of open clients
    pub fn claims_clients(&self) -> bool {
        !matches!(self, Self::Purged { .. })
    }
}

impl fmt::Display for ActivationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColdStart { copied } => write!(f, "cold start, {} shell file(s) cached", copied),
            Self::WarmUpgrade {
                retained,
                evicted,
                copied,
            } => write!(
                f,
                "upgrade, {} retained, {} evicted, {} shell file(s) cached",
                retained, evicted, copied
            ),
            Self::Purged { reason } => write!(f, "purged after failure: {}", reason),
        }
    }
}

/// Applies the activation protocol to the three stores
pub struct Reconciler<'a> {
    config: &'a WorkerConfig,
    storage: &'a dyn CacheStorage,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a WorkerConfig, storage: &'a dyn CacheStorage) -> Self {
        Self { config, storage }
    }

    /// Run the protocol; failures are absorbed by purging every store
    pub async fn run(&self) -> ActivationOutcome {
        match self.try_run().await {
            Ok(outcome) => {
                info!("Activation complete: {}", outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to upgrade cache, purging all stores: {}", e);
                self.purge().await;
                ActivationOutcome::Purged {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_run(&self) -> BundleResult<ActivationOutcome> {
        let names = &self.config.stores;
        let mut content = self.storage.open(&names.content).await?;
        let staging = self.storage.open(&names.staging).await?;
        let manifest_store = self.storage.open(&names.manifest).await?;

        let Some(record) = manifest_store.get(MANIFEST_RECORD_KEY).await? else {
            debug!("No manifest record, performing cold start");
            self.storage.delete(&names.content).await?;
            content = self.storage.open(&names.content).await?;

            let copied = copy_entries(&*staging, &*content).await?;
            self.storage.delete(&names.staging).await?;
            self.save_record(&*manifest_store).await?;
            return Ok(ActivationOutcome::ColdStart { copied });
        };

        let old = ResourceManifest::from_json(&record.body)?;
        let new = &self.config.bundle.resources;

        let entries: Vec<(String, String)> = content
            .keys()
            .await?
            .into_iter()
            .map(|url| {
                let key = keys::storage_key(&self.config.origin, &url);
                (url, key)
            })
            .collect();

        let evict: HashSet<&str> =
            plan_evictions(&old, new, entries.iter().map(|(_, key)| key.as_str()))
                .into_iter()
                .collect();

        let mut evicted = 0;
        for (url, key) in &entries {
            if evict.contains(key.as_str()) {
                content.delete(url).await?;
                debug!("Evicted {}", key);
                evicted += 1;
            }
        }
        let retained = entries.len() - evicted;

        // Staged shell files overwrite anything retained above
        let copied = copy_entries(&*staging, &*content).await?;
        self.storage.delete(&names.staging).await?;
        self.save_record(&*manifest_store).await?;

        Ok(ActivationOutcome::WarmUpgrade {
            retained,
            evicted,
            copied,
        })
    }

    async fn save_record(&self, manifest_store: &dyn CacheStore) -> BundleResult<()> {
        let body = self.config.bundle.resources.to_json()?;
        let record = Response::ok(body).with_header("Content-Type", "application/json");
        manifest_store.put(MANIFEST_RECORD_KEY, &record).await
    }

    /// Delete all three stores, attempting each even if one fails
    pub async fn purge(&self) {
        let names = &self.config.stores;
        for name in [&names.content, &names.staging, &names.manifest] {
            if let Err(e) = self.storage.delete(name).await {
                warn!("Failed to delete store {} during purge: {}", name, e);
            }
        }
    }
}

/// Copy every entry of `from` into `to`, returning the count
async fn copy_entries(from: &dyn CacheStore, to: &dyn CacheStore) -> BundleResult<usize> {
    let mut copied = 0;
    for url in from.keys().await? {
        if let Some(response) = from.get(&url).await? {
            to.put(&url, &response).await?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Read the manifest record, if any
pub async fn load_record(
    storage: &dyn CacheStorage,
    manifest_store: &str,
) -> BundleResult<Option<ResourceManifest>> {
    if !storage.has(manifest_store).await? {
        return Ok(None);
    }
    let store = storage.open(manifest_store).await?;
    match store.get(MANIFEST_RECORD_KEY).await? {
        Some(record) => Ok(Some(ResourceManifest::from_json(&record.body)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use crate::worker::testing::{bundle, FaultyStorage, ORIGIN};

    async fn stage(storage: &dyn CacheStorage, paths: &[(&str, &str)]) {
        let staging = storage.open("app-temp-cache").await.unwrap();
        for (path, body) in paths {
            staging
                .put(&keys::resolve(ORIGIN, path), &Response::ok(*body))
                .await
                .unwrap();
        }
    }

    async fn body(storage: &dyn CacheStorage, path: &str) -> Option<String> {
        let content = storage.open("app-cache").await.unwrap();
        content
            .get(&keys::resolve(ORIGIN, path))
            .await
            .unwrap()
            .map(|r| String::from_utf8(r.body).unwrap())
    }

    #[tokio::test]
    async fn cold_start_contains_exactly_shell_files() {
        let storage = MemoryStorage::new();
        let config = WorkerConfig::new(
            ORIGIN,
            bundle(&[("a.js", "h1"), ("b.js", "h2"), ("c.js", "h3")], &["a.js", "b.js"]),
        )
        .unwrap();

        // leftovers from some earlier, unrecorded run
        let content = storage.open("app-cache").await.unwrap();
        content
            .put(&keys::resolve(ORIGIN, "c.js"), &Response::ok("stale"))
            .await
            .unwrap();
        stage(&storage, &[("a.js", "A1"), ("b.js", "B1")]).await;

        let outcome = Reconciler::new(&config, &storage).run().await;

        assert_eq!(outcome, ActivationOutcome::ColdStart { copied: 2 });
        assert!(outcome.claims_clients());
        let content = storage.open("app-cache").await.unwrap();
        assert_eq!(
            content.keys().await.unwrap(),
            vec!["https://app.test/a.js", "https://app.test/b.js"]
        );
        assert!(!storage.has("app-temp-cache").await.unwrap());

        let record = load_record(&storage, "app-manifest").await.unwrap().unwrap();
        assert_eq!(record, config.bundle.resources);
    }

    #[tokio::test]
    async fn warm_upgrade_keeps_unchanged_entries() {
        let storage = MemoryStorage::new();
        let v1 = WorkerConfig::new(ORIGIN, bundle(&[("a.js", "h1"), ("b.js", "h2")], &["a.js"]))
            .unwrap();
        stage(&storage, &[("a.js", "A1")]).await;
        Reconciler::new(&v1, &storage).run().await;

        // b.js cached lazily while v1 was active
        let content = storage.open("app-cache").await.unwrap();
        content
            .put(&keys::resolve(ORIGIN, "b.js"), &Response::ok("B1"))
            .await
            .unwrap();

        let v2 = WorkerConfig::new(
            ORIGIN,
            bundle(&[("a.js", "h1"), ("b.js", "h3"), ("c.js", "h4")], &["c.js"]),
        )
        .unwrap();
        stage(&storage, &[("c.js", "C2")]).await;
        let outcome = Reconciler::new(&v2, &storage).run().await;

        assert_eq!(
            outcome,
            ActivationOutcome::WarmUpgrade {
                retained: 1,
                evicted: 1,
                copied: 1
            }
        );
        assert_eq!(body(&storage, "a.js").await.as_deref(), Some("A1"));
        assert_eq!(body(&storage, "b.js").await, None);
        assert_eq!(body(&storage, "c.js").await.as_deref(), Some("C2"));

        let record = load_record(&storage, "app-manifest").await.unwrap().unwrap();
        assert_eq!(record, v2.bundle.resources);
    }

    #[tokio::test]
    async fn staged_entries_overwrite_retained() {
        let storage = MemoryStorage::new();
        let config =
            WorkerConfig::new(ORIGIN, bundle(&[("a.js", "h1")], &["a.js"])).unwrap();
        stage(&storage, &[("a.js", "first")]).await;
        Reconciler::new(&config, &storage).run().await;

        stage(&storage, &[("a.js", "second")]).await;
        let outcome = Reconciler::new(&config, &storage).run().await;

        assert!(matches!(outcome, ActivationOutcome::WarmUpgrade { retained: 1, .. }));
        assert_eq!(body(&storage, "a.js").await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn failure_purges_everything() {
        let storage = FaultyStorage::new();
        let config = WorkerConfig::new(ORIGIN, bundle(&[("a.js", "h1")], &["a.js"])).unwrap();
        stage(&storage, &[("a.js", "A1")]).await;
        storage.fail_puts_on("app-cache");

        let outcome = Reconciler::new(&config, &storage).run().await;

        assert!(matches!(outcome, ActivationOutcome::Purged { .. }));
        assert!(!outcome.claims_clients());
        assert!(storage.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_purges() {
        let storage = MemoryStorage::new();
        let config = WorkerConfig::new(ORIGIN, bundle(&[("a.js", "h1")], &[])).unwrap();
        let manifest = storage.open("app-manifest").await.unwrap();
        manifest
            .put(MANIFEST_RECORD_KEY, &Response::ok("not json"))
            .await
            .unwrap();

        let outcome = Reconciler::new(&config, &storage).run().await;

        assert!(matches!(outcome, ActivationOutcome::Purged { .. }));
        assert!(load_record(&storage, "app-manifest").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_record_absent() {
        let storage = MemoryStorage::new();
        assert!(load_record(&storage, "app-manifest").await.unwrap().is_none());
        // checking must not create the store
        assert!(!storage.has("app-manifest").await.unwrap());
    }
}
