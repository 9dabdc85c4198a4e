//! In-process store backend

use super::{validate_store_name, CacheStorage, CacheStore, StoreHandle};
use crate::error::BundleResult;
use crate::http::Response;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A store held in memory
#[derive(Debug)]
struct MemoryStore {
    name: String,
    entries: RwLock<BTreeMap<String, Response>>,
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, url: &str) -> BundleResult<Option<Response>> {
        Ok(self.entries.read().await.get(url).cloned())
    }

    async fn put(&self, url: &str, response: &Response) -> BundleResult<()> {
        self.entries
            .write()
            .await
            .insert(url.to_string(), response.clone());
        Ok(())
    }

    async fn delete(&self, url: &str) -> BundleResult<bool> {
        Ok(self.entries.write().await.remove(url).is_some())
    }

    async fn keys(&self) -> BundleResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}

/// Stores that live for the lifetime of the process
///
/// Deleting a store detaches it: handles opened earlier keep working on
/// the old contents, while the next `open` starts empty.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    stores: Arc<RwLock<HashMap<String, Arc<MemoryStore>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> BundleResult<StoreHandle> {
        validate_store_name(name)?;
        let mut stores = self.stores.write().await;
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryStore {
                    name: name.to_string(),
                    entries: RwLock::new(BTreeMap::new()),
                })
            })
            .clone();
        Ok(store)
    }

    async fn delete(&self, name: &str) -> BundleResult<bool> {
        Ok(self.stores.write().await.remove(name).is_some())
    }

    async fn has(&self, name: &str) -> BundleResult<bool> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn names(&self) -> BundleResult<Vec<String>> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
