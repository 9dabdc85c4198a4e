//! Bundlecache - offline cache manager for web app bundles
//!
//! Keeps a statically compiled web application available offline: the
//! shell files are prefetched on install, the cache is reconciled against
//! the resource manifest on activate, and requests are then answered from
//! the cache or the network according to per-resource policy.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod journal;
pub mod keys;
pub mod manifest;
pub mod store;
pub mod ui;
pub mod worker;

pub use error::{BundleError, BundleResult};
