//! Named request/response stores
//!
//! The worker keeps three independently named stores:
//!
//! | Store | Holds |
//! |-------|-------|
//! | content | Responses served to the application |
//! | staging | Shell files downloaded during install, merged on activate |
//! | manifest | The manifest record of the last activated version |
//!
//! Stores are opened by name from a [`CacheStorage`], which also deletes
//! whole stores. Two backends are provided: [`MemoryStorage`] for embedding
//! and tests, and [`DiskStorage`], which persists across restarts.

mod disk;
mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::{BundleError, BundleResult};
use crate::http::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to an open store
pub type StoreHandle = Arc<dyn CacheStore>;

/// One named store of URL to response entries
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name
    fn name(&self) -> &str;

    /// Look up the response cached for a URL
    async fn get(&self, url: &str) -> BundleResult<Option<Response>>;

    /// Insert or replace the response for a URL
    async fn put(&self, url: &str, response: &Response) -> BundleResult<()>;

    /// Remove an entry, returning whether it existed
    async fn delete(&self, url: &str) -> BundleResult<bool>;

    /// URLs of all entries, sorted
    async fn keys(&self) -> BundleResult<Vec<String>>;
}

/// The set of named stores available to the worker
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it if needed
    async fn open(&self, name: &str) -> BundleResult<StoreHandle>;

    /// Delete a whole store, returning whether it existed
    async fn delete(&self, name: &str) -> BundleResult<bool>;

    /// Whether a store exists
    async fn has(&self, name: &str) -> BundleResult<bool>;

    /// Names of existing stores, sorted
    async fn names(&self) -> BundleResult<Vec<String>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Identifiers of the three stores used by the worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreNames {
    /// Responses served to the application
    pub content: String,
    /// Shell files awaiting activation
    pub staging: String,
    /// Manifest record of the active version
    pub manifest: String,
}

impl Default for StoreNames {
    fn default() -> Self {
        Self {
            content: "app-cache".to_string(),
            staging: "app-temp-cache".to_string(),
            manifest: "app-manifest".to_string(),
        }
    }
}

impl StoreNames {
    /// Check every name is usable and the three are distinct
    pub fn validate(&self) -> BundleResult<()> {
        for name in [&self.content, &self.staging, &self.manifest] {
            validate_store_name(name)?;
        }
        if self.content == self.staging
            || self.content == self.manifest
            || self.staging == self.manifest
        {
            return Err(BundleError::StoreNameInvalid(
                "content, staging and manifest stores must have distinct names".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reject names that cannot be used as a single directory component
pub(crate) fn validate_store_name(name: &str) -> BundleResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(BundleError::StoreNameInvalid(name.to_string()));
    }
    Ok(())
}
