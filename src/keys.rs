//! Mapping between absolute request URLs and manifest keys
//!
//! Manifest keys are paths relative to the application origin, with the
//! entry document stored under `/`.

use crate::error::{BundleError, BundleResult};

/// Key under which the entry document is cached and listed
pub const ROOT_KEY: &str = "/";

/// Cache-busting query marker appended by the application loader
const VERSION_MARKER: &str = "?v=";

/// Validate and normalize an origin (scheme + host, no trailing slash)
pub fn normalize_origin(origin: &str) -> BundleResult<String> {
    let trimmed = origin.trim().trim_end_matches('/');
    let invalid = |reason: &str| BundleError::OriginInvalid {
        origin: origin.to_string(),
        reason: reason.to_string(),
    };

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| invalid("must start with http:// or https://"))?;

    if rest.is_empty() {
        return Err(invalid("missing host"));
    }
    if rest.contains(['?', '#']) {
        return Err(invalid("must not carry a query or fragment"));
    }

    Ok(trimmed.to_string())
}

/// Key of an entry already held in a store
///
/// Strips the origin and the following `/`. An empty remainder is the root.
pub fn storage_key(origin: &str, url: &str) -> String {
    let key = strip_origin(origin, url);
    if key.is_empty() {
        ROOT_KEY.to_string()
    } else {
        key.to_string()
    }
}

/// Key of an incoming request
///
/// Like [`storage_key`], but also drops a trailing `?v=` cache-busting
/// marker and collapses bare-origin and `/#fragment` URLs to the root.
pub fn request_key(origin: &str, url: &str) -> String {
    let mut key = strip_origin(origin, url);
    if let Some(pos) = key.find(VERSION_MARKER) {
        key = &key[..pos];
    }

    let is_root = url == origin || url.starts_with(&format!("{}/#", origin)) || key.is_empty();
    if is_root {
        ROOT_KEY.to_string()
    } else {
        key.to_string()
    }
}

/// Absolute URL for a manifest key
pub fn resolve(origin: &str, key: &str) -> String {
    if key == ROOT_KEY {
        format!("{}/", origin)
    } else {
        format!("{}/{}", origin, key.trim_start_matches('/'))
    }
}

fn strip_origin<'a>(origin: &str, url: &'a str) -> &'a str {
    match url.strip_prefix(origin) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => {
            rest.strip_prefix('/').unwrap_or(rest)
        }
        // Another host that merely shares a prefix with the origin
        _ => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://app.test";

    #[test]
    fn normalize_origin_trims_slash() {
        assert_eq!(
            normalize_origin("https://app.test/").unwrap(),
            "https://app.test"
        );
        assert_eq!(
            normalize_origin(" http://localhost:8080 ").unwrap(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn normalize_origin_rejects_garbage() {
        assert!(normalize_origin("app.test").is_err());
        assert!(normalize_origin("https://").is_err());
        assert!(normalize_origin("https://app.test/?x=1").is_err());
    }

    #[test]
    fn storage_key_strips_origin() {
        assert_eq!(storage_key(ORIGIN, "https://app.test/main.js"), "main.js");
        assert_eq!(
            storage_key(ORIGIN, "https://app.test/assets/a.png"),
            "assets/a.png"
        );
        assert_eq!(storage_key(ORIGIN, "https://app.test/"), "/");
    }

    #[test]
    fn request_key_strips_version_marker() {
        assert_eq!(
            request_key(ORIGIN, "https://app.test/main.js?v=123"),
            "main.js"
        );
        assert_eq!(
            request_key(ORIGIN, "https://app.test/main.js?x=1"),
            "main.js?x=1"
        );
    }

    #[test]
    fn request_key_collapses_root_forms() {
        assert_eq!(request_key(ORIGIN, "https://app.test"), "/");
        assert_eq!(request_key(ORIGIN, "https://app.test/"), "/");
        assert_eq!(request_key(ORIGIN, "https://app.test/#/settings"), "/");
        assert_eq!(request_key(ORIGIN, "https://app.test/?v=9"), "/");
    }

    #[test]
    fn request_key_keeps_foreign_urls_unmatched() {
        let key = request_key(ORIGIN, "https://cdn.test/lib.js");
        assert_eq!(key, "https://cdn.test/lib.js");

        let key = request_key(ORIGIN, "https://app.testing/main.js");
        assert_eq!(key, "https://app.testing/main.js");
    }

    #[test]
    fn resolve_builds_absolute_urls() {
        assert_eq!(resolve(ORIGIN, "/"), "https://app.test/");
        assert_eq!(resolve(ORIGIN, "main.js"), "https://app.test/main.js");
        assert_eq!(storage_key(ORIGIN, &resolve(ORIGIN, "/")), "/");
    }
}
