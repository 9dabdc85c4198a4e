//! Pure planning over manifests and cached keys
//!
//! These functions decide what should happen to a store; the async
//! components apply the decisions.

use crate::manifest::ResourceManifest;
use std::collections::HashSet;

/// Whether a cached entry survives an upgrade from `old` to `new`
///
/// Retained only when the key is still listed and its fingerprint is
/// byte-for-byte equal in both versions.
pub fn is_retained(old: &ResourceManifest, new: &ResourceManifest, key: &str) -> bool {
    match (old.fingerprint(key), new.fingerprint(key)) {
        (Some(before), Some(after)) => before == after,
        _ => false,
    }
}

/// Cached keys that must be evicted when upgrading from `old` to `new`
pub fn plan_evictions<'a, I>(old: &ResourceManifest, new: &ResourceManifest, cached: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    cached
        .into_iter()
        .filter(|key| !is_retained(old, new, key))
        .collect()
}

/// Manifest keys with no cached entry, in manifest order
pub fn missing_keys<'a, I>(manifest: &ResourceManifest, cached: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let cached: HashSet<&str> = cached.into_iter().collect();
    manifest
        .keys()
        .filter(|key| !cached.contains(key))
        .map(str::to_string)
        .collect()
}
