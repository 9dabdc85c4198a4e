//! Test doubles for the worker components

use crate::error::{BundleError, BundleResult};
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::manifest::{Bundle, ResourceManifest, ShellFileSet};
use crate::store::{CacheStorage, CacheStore, MemoryStorage, StoreHandle};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const ORIGIN: &str = "https://app.test";

/// Build a validated bundle
pub fn bundle(resources: &[(&str, &str)], shell: &[&str]) -> Bundle {
    let resources: ResourceManifest = resources.iter().copied().collect();
    Bundle::new(resources, ShellFileSet::new(shell.iter().copied())).unwrap()
}

/// Path of a URL under [`ORIGIN`], root as `/`
fn path_of(url: &str) -> String {
    let path = url
        .strip_prefix(ORIGIN)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(url);
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Fetcher answering from a table of paths
///
/// Served paths answer 200 with the path (or a set body) as content,
/// failing paths return a network error, anything else answers 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    bodies: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    log: Mutex<Vec<Request>>,
}

impl ScriptedFetcher {
    pub fn serving(paths: &[&str]) -> Self {
        let fetcher = Self::default();
        for path in paths {
            fetcher.set_body(path, path);
        }
        fetcher
    }

    pub fn offline() -> Self {
        let fetcher = Self::default();
        fetcher.set_offline(true);
        fetcher
    }

    pub fn failing(self, paths: &[&str]) -> Self {
        self.failing
            .lock()
            .unwrap()
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn set_body(&self, path: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(path.to_string(), body.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    /// How many requests were made for a path
    pub fn count(&self, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| path_of(&r.url) == path)
            .count()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> BundleResult<Response> {
        self.log.lock().unwrap().push(request.clone());
        let path = path_of(&request.url);

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&path) {
            return Err(BundleError::network(&request.url, "connection refused"));
        }

        let body = self.bodies.lock().unwrap().get(&path).cloned();
        Ok(match body {
            Some(body) => Response::ok(body),
            None => Response::new(404, "not found"),
        })
    }
}

/// Memory storage whose stores can be told to reject writes
#[derive(Clone, Default)]
pub struct FaultyStorage {
    inner: MemoryStorage,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `put` on the named store fail
    pub fn fail_puts_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Let writes through again
    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }
}

struct FaultyStore {
    inner: StoreHandle,
    failing: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl CacheStore for FaultyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, url: &str) -> BundleResult<Option<Response>> {
        self.inner.get(url).await
    }

    async fn put(&self, url: &str, response: &Response) -> BundleResult<()> {
        if self.failing.lock().unwrap().contains(self.inner.name()) {
            return Err(BundleError::store(self.inner.name(), "quota exceeded"));
        }
        self.inner.put(url, response).await
    }

    async fn delete(&self, url: &str) -> BundleResult<bool> {
        self.inner.delete(url).await
    }

    async fn keys(&self) -> BundleResult<Vec<String>> {
        self.inner.keys().await
    }
}

#[async_trait]
impl CacheStorage for FaultyStorage {
    async fn open(&self, name: &str) -> BundleResult<StoreHandle> {
        let inner = self.inner.open(name).await?;
        Ok(Arc::new(FaultyStore {
            inner,
            failing: self.failing.clone(),
        }))
    }

    async fn delete(&self, name: &str) -> BundleResult<bool> {
        self.inner.delete(name).await
    }

    async fn has(&self, name: &str) -> BundleResult<bool> {
        self.inner.has(name).await
    }

    async fn names(&self) -> BundleResult<Vec<String>> {
        self.inner.names().await
    }

    fn backend_name(&self) -> &'static str {
        "faulty-memory"
    }
}
