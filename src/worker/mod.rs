//! The cache worker
//!
//! Keeps a deployed bundle available offline:
//!
//! - **install** downloads the shell files into the staging store
//! - **activate** reconciles staging, content and the manifest record
//! - **fetch** serves bundle resources, network-first for the entry document
//! - **message** handles `skipWaiting` and `downloadOffline`
//!
//! The components take their configuration and capabilities by reference
//! and hold no state of their own; [`Worker`] sequences them.

pub mod control;
pub mod interceptor;
pub mod lifecycle;
pub mod online_first;
pub mod plan;
pub mod prefetch;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

pub use control::{ensure_cached, ControlMessage, MessageOutcome};
pub use interceptor::{Interception, Interceptor};
pub use lifecycle::{InstallReport, Worker, WorkerState};
pub use online_first::online_first;
pub use plan::{is_retained, missing_keys, plan_evictions};
pub use prefetch::ShellPrefetcher;
pub use reconcile::{load_record, ActivationOutcome, Reconciler, MANIFEST_RECORD_KEY};

use crate::error::BundleResult;
use crate::keys;
use crate::manifest::Bundle;
use crate::store::StoreNames;

/// Immutable settings for one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Normalized origin, no trailing slash
    pub origin: String,
    /// The deployed version being served
    pub bundle: Bundle,
    /// Names of the three stores
    pub stores: StoreNames,
}

impl WorkerConfig {
    /// Build with default store names
    pub fn new(origin: &str, bundle: Bundle) -> BundleResult<Self> {
        Self::with_stores(origin, bundle, StoreNames::default())
    }

    /// Build with explicit store names
    pub fn with_stores(origin: &str, bundle: Bundle, stores: StoreNames) -> BundleResult<Self> {
        stores.validate()?;
        bundle.validate()?;
        Ok(Self {
            origin: keys::normalize_origin(origin)?,
            bundle,
            stores,
        })
    }
}
