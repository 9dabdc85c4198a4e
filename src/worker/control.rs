//! Control channel commands

use super::plan::missing_keys;
use super::WorkerConfig;
use crate::error::{BundleError, BundleResult};
use crate::fetch::Fetcher;
use crate::http::Request;
use crate::keys;
use crate::store::CacheStorage;
use futures_util::future::try_join_all;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// A command delivered by a client page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate the waiting worker immediately
    SkipWaiting,
    /// Cache every manifest resource not cached yet
    DownloadOffline,
}

impl ControlMessage {
    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipWaiting => "skipWaiting",
            Self::DownloadOffline => "downloadOffline",
        }
    }
}

impl FromStr for ControlMessage {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skipWaiting" => Ok(Self::SkipWaiting),
            "downloadOffline" => Ok(Self::DownloadOffline),
            other => Err(BundleError::User(format!("unknown control message: {}", other))),
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What handling a message did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Immediate activation requested
    SkipWaiting,
    /// Missing resources fetched and stored
    Downloaded { stored: usize },
    /// Unrecognized message
    Ignored,
}

/// Fetch every manifest key missing from the content store
///
/// All missing resources are fetched concurrently and stored only if every
/// one came back ok, so a failed batch leaves the store untouched.
/// Returns how many entries were stored.
pub async fn ensure_cached(
    config: &WorkerConfig,
    storage: &dyn CacheStorage,
    fetcher: &dyn Fetcher,
) -> BundleResult<usize> {
    let content = storage.open(&config.stores.content).await?;
    let cached: Vec<String> = content
        .keys()
        .await?
        .iter()
        .map(|url| keys::storage_key(&config.origin, url))
        .collect();

    let missing = missing_keys(
        &config.bundle.resources,
        cached.iter().map(String::as_str),
    );
    if missing.is_empty() {
        debug!("All {} resources already cached", config.bundle.resources.len());
        return Ok(0);
    }

    info!("Downloading {} missing resource(s)", missing.len());
    let requests: Vec<Request> = missing
        .iter()
        .map(|key| Request::get(keys::resolve(&config.origin, key)))
        .collect();

    let responses = try_join_all(requests.iter().map(|req| fetcher.fetch(req))).await?;

    if let Some((req, resp)) = requests
        .iter()
        .zip(&responses)
        .find(|(_, resp)| !resp.is_ok())
    {
        return Err(BundleError::BatchDownload {
            url: req.url.clone(),
            status: resp.status,
        });
    }

    for (req, resp) in requests.iter().zip(&responses) {
        content.put(&req.url, resp).await?;
    }

    Ok(responses.len())
}
