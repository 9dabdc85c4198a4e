//! Resource manifest and bundle descriptor
//!
//! A bundle descriptor is generated by the application build and describes
//! one deployed version:
//!
//! ```json
//! {
//!   "version": "1.4.0+12",
//!   "resources": { "index.html": "00fe60ac", "/": "00fe60ac", "main.js": "33060dd4" },
//!   "shell": ["main.js", "index.html"]
//! }
//! ```

use crate::error::{BundleError, BundleResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Request path to content fingerprint, for one deployed version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest(BTreeMap<String, String>);

impl ResourceManifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint for a key, if listed
    pub fn fingerprint(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether the key is listed
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate `(key, fingerprint)` pairs in sorted order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize to the flat JSON object used for the manifest record
    pub fn to_json(&self) -> BundleResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse the flat JSON object used for the manifest record
    pub fn from_json(bytes: &[u8]) -> BundleResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| BundleError::ManifestRecordCorrupt(e.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResourceManifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Ordered paths that must be cached before the worker is ready
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ShellFileSet(Vec<String>);

impl ShellFileSet {
    /// Build from paths, dropping repeats (first occurrence wins)
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = Vec::new();
        for path in paths {
            let path = path.into();
            if !seen.contains(&path) {
                seen.push(path);
            }
        }
        Self(seen)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for ShellFileSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let paths = Vec::<String>::deserialize(deserializer)?;
        Ok(Self::new(paths))
    }
}

/// One deployed version of the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Build label, informational only
    #[serde(default)]
    pub version: Option<String>,

    /// Every cacheable resource with its fingerprint
    pub resources: ResourceManifest,

    /// Files downloaded during install
    #[serde(default)]
    pub shell: ShellFileSet,
}

impl Bundle {
    /// Build and validate a bundle from parts
    pub fn new(resources: ResourceManifest, shell: ShellFileSet) -> BundleResult<Self> {
        let bundle = Self {
            version: None,
            resources,
            shell,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Read a descriptor from disk
    pub async fn from_file(path: &Path) -> BundleResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            BundleError::io(format!("reading bundle descriptor {}", path.display()), e)
        })?;
        Self::parse(&content).map_err(|e| match e {
            BundleError::Json(e) => BundleError::BundleInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
            other => other,
        })
    }

    /// Parse a descriptor from a JSON string
    pub fn parse(content: &str) -> BundleResult<Self> {
        let bundle: Self = serde_json::from_str(content)?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Every shell file must be a manifest key
    pub fn validate(&self) -> BundleResult<()> {
        if let Some(missing) = self.shell.iter().find(|p| !self.resources.contains(p)) {
            return Err(BundleError::ShellFileNotInManifest(missing.to_string()));
        }
        Ok(())
    }
}
