//! Durable store backend on the local filesystem
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<store-name>/<digest>.json   entry metadata (url, status, headers)
//! <root>/<store-name>/<digest>.body   raw response body
//! ```
//!
//! `<digest>` is the first 32 hex chars of the SHA256 of the URL. The
//! metadata file is written last via temp file + rename, so an entry is
//! visible only once its body is complete.

use super::{validate_store_name, CacheStorage, CacheStore, StoreHandle};
use crate::error::{BundleError, BundleResult};
use crate::http::Response;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

const META_EXT: &str = "json";
const BODY_EXT: &str = "body";

/// Entry metadata persisted next to the body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Hash a URL to a file stem
fn entry_digest(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

fn is_not_found(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::NotFound
}

/// One store directory
#[derive(Debug)]
struct DiskStore {
    name: String,
    dir: PathBuf,
}

impl DiskStore {
    fn meta_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", digest, META_EXT))
    }

    fn body_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", digest, BODY_EXT))
    }

    fn io_err(&self, action: &str, path: &Path, e: std::io::Error) -> BundleError {
        BundleError::store(
            &self.name,
            format!("{} {}: {}", action, path.display(), e),
        )
    }

    async fn read_meta(&self, path: &Path) -> BundleResult<Option<EntryMeta>> {
        let content = match fs::read(path).await {
            Ok(c) => c,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(self.io_err("reading", path, e)),
        };
        let meta = serde_json::from_slice(&content).map_err(|e| {
            BundleError::store(&self.name, format!("corrupt entry {}: {}", path.display(), e))
        })?;
        Ok(Some(meta))
    }

    /// Write to a sibling temp file then rename over the target
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> BundleResult<()> {
        let temp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&temp, data)
            .await
            .map_err(|e| self.io_err("writing", &temp, e))?;
        if let Err(e) = fs::rename(&temp, path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(self.io_err("renaming", path, e));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, url: &str) -> BundleResult<Option<Response>> {
        let digest = entry_digest(url);
        let Some(meta) = self.read_meta(&self.meta_path(&digest)).await? else {
            return Ok(None);
        };
        if meta.url != url {
            warn!("Digest collision in store {}: {} vs {}", self.name, meta.url, url);
            return Ok(None);
        }

        let body_path = self.body_path(&digest);
        let body = match fs::read(&body_path).await {
            Ok(b) => b,
            Err(e) if is_not_found(&e) => {
                warn!("Entry {} in store {} has no body, ignoring", url, self.name);
                return Ok(None);
            }
            Err(e) => return Err(self.io_err("reading", &body_path, e)),
        };

        Ok(Some(Response {
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(&self, url: &str, response: &Response) -> BundleResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.io_err("creating", &self.dir, e))?;

        let digest = entry_digest(url);
        let meta = EntryMeta {
            url: url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };

        self.write_atomic(&self.body_path(&digest), &response.body)
            .await?;
        self.write_atomic(&self.meta_path(&digest), &serde_json::to_vec_pretty(&meta)?)
            .await?;

        debug!("Stored {} in {} ({} bytes)", url, self.name, response.body.len());
        Ok(())
    }

    async fn delete(&self, url: &str) -> BundleResult<bool> {
        let digest = entry_digest(url);
        let meta_path = self.meta_path(&digest);

        let existed = match self.read_meta(&meta_path).await? {
            Some(meta) if meta.url == url => true,
            _ => return Ok(false),
        };

        for path in [meta_path, self.body_path(&digest)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if is_not_found(&e) => {}
                Err(e) => return Err(self.io_err("removing", &path, e)),
            }
        }

        Ok(existed)
    }

    async fn keys(&self) -> BundleResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if is_not_found(&e) => return Ok(vec![]),
            Err(e) => return Err(self.io_err("listing", &self.dir, e)),
        };

        let mut urls = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.io_err("listing", &self.dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == META_EXT) {
                if let Some(meta) = self.read_meta(&path).await? {
                    urls.push(meta.url);
                }
            }
        }

        urls.sort();
        Ok(urls)
    }
}

/// Stores persisted as directories under a root
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Use `root` as the storage directory (created lazily)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> BundleResult<PathBuf> {
        validate_store_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> BundleResult<StoreHandle> {
        let dir = self.store_dir(name)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            BundleError::store(name, format!("creating {}: {}", dir.display(), e))
        })?;

        Ok(Arc::new(DiskStore {
            name: name.to_string(),
            dir,
        }))
    }

    async fn delete(&self, name: &str) -> BundleResult<bool> {
        let dir = self.store_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted store {}", name);
                Ok(true)
            }
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(BundleError::store(
                name,
                format!("deleting {}: {}", dir.display(), e),
            )),
        }
    }

    async fn has(&self, name: &str) -> BundleResult<bool> {
        let dir = self.store_dir(name)?;
        Ok(fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()))
    }

    async fn names(&self) -> BundleResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if is_not_found(&e) => return Ok(vec![]),
            Err(e) => {
                return Err(BundleError::io(
                    format!("listing stores in {}", self.root.display()),
                    e,
                ))
            }
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BundleError::io("reading store entry", e))?
        {
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
