//! Error types for bundlecache
//!
//! All modules use `BundleResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bundlecache operations
pub type BundleResult<T> = Result<T, BundleError>;

/// All errors that can occur in bundlecache
#[derive(Error, Debug)]
pub enum BundleError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No application origin configured")]
    OriginMissing,

    #[error("Invalid origin {origin}: {reason}")]
    OriginInvalid { origin: String, reason: String },

    // Bundle descriptor errors
    #[error("No bundle descriptor configured")]
    BundleMissing,

    #[error("Invalid bundle descriptor {path}: {reason}")]
    BundleInvalid { path: PathBuf, reason: String },

    #[error("Shell file {0} is not listed in the resource manifest")]
    ShellFileNotInManifest(String),

    #[error("Stored manifest record is corrupt: {0}")]
    ManifestRecordCorrupt(String),

    // Cache store errors
    #[error("Invalid store name: {0}")]
    StoreNameInvalid(String),

    #[error("Cache store {store} failed: {reason}")]
    Store { store: String, reason: String },

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Prefetch of {path} failed: {reason}")]
    Prefetch { path: String, reason: String },

    #[error("Batch download failed for {url}: HTTP {status}")]
    BatchDownload { url: String, status: u16 },

    // Lifecycle errors
    #[error("Worker cannot {action} while {state}")]
    InvalidState { action: String, state: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl BundleError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cache store error
    pub fn store(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error came from the network rather than the cache
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Prefetch { .. } | Self::BatchDownload { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::OriginMissing => Some("Pass --origin or run: bundlecache config init"),
            Self::BundleMissing => Some("Pass --bundle <path> or set app.bundle in config"),
            Self::ShellFileNotInManifest(_) => {
                Some("Every shell file must also appear in the resources table")
            }
            Self::Prefetch { .. } => Some("Check that the origin is reachable, then run install again"),
            Self::InvalidState { .. } => Some("Run: bundlecache upgrade"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BundleError::ShellFileNotInManifest("main.js".to_string());
        assert!(err.to_string().contains("main.js"));
    }

    #[test]
    fn error_hint() {
        let err = BundleError::OriginMissing;
        assert_eq!(
            err.hint(),
            Some("Pass --origin or run: bundlecache config init")
        );
        assert!(BundleError::Internal("x".into()).hint().is_none());
    }

    #[test]
    fn network_classification() {
        assert!(BundleError::network("https://a", "refused").is_network());
        assert!(!BundleError::store("app-cache", "disk full").is_network());
    }
}
