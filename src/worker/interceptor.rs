//! Request interception

use super::online_first::online_first;
use super::WorkerConfig;
use crate::error::BundleResult;
use crate::fetch::Fetcher;
use crate::http::{Method, Request, Response};
use crate::keys::{self, ROOT_KEY};
use crate::store::CacheStorage;
use tracing::{debug, warn};

/// Result of offering a request to the worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Not a bundle resource; the host handles it normally
    Passthrough,
    /// Answered by the worker
    Respond(Response),
}

impl Interception {
    /// The response, if the request was intercepted
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Passthrough => None,
            Self::Respond(response) => Some(response),
        }
    }
}

/// Serves bundle resources from the content store
pub struct Interceptor<'a> {
    config: &'a WorkerConfig,
    storage: &'a dyn CacheStorage,
    fetcher: &'a dyn Fetcher,
}

impl<'a> Interceptor<'a> {
    pub fn new(
        config: &'a WorkerConfig,
        storage: &'a dyn CacheStorage,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
        }
    }

    /// Handle a request
    ///
    /// Only GET requests for manifest keys are intercepted. The entry
    /// document goes network-first; everything else is cache-first, with
    /// ok network responses stored on a miss.
    pub async fn handle(&self, request: &Request) -> BundleResult<Interception> {
        if request.method != Method::Get {
            return Ok(Interception::Passthrough);
        }

        let key = keys::request_key(&self.config.origin, &request.url);
        if !self.config.bundle.resources.contains(&key) {
            debug!("Passthrough {}", request.url);
            return Ok(Interception::Passthrough);
        }

        if key == ROOT_KEY {
            // bare-origin and fragment forms share the single `/` entry
            let canonical = Request {
                url: keys::resolve(&self.config.origin, ROOT_KEY),
                ..request.clone()
            };
            let response = online_first(
                self.storage,
                &self.config.stores.content,
                self.fetcher,
                &canonical,
            )
            .await?;
            return Ok(Interception::Respond(response));
        }

        let content = self.storage.open(&self.config.stores.content).await?;
        if let Some(hit) = content.get(&request.url).await? {
            debug!("Cache hit {}", key);
            return Ok(Interception::Respond(hit));
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_ok() {
            if let Err(e) = content.put(&request.url, &response).await {
                warn!("Failed to cache {}: {}", request.url, e);
            }
        } else {
            debug!("Not caching {}: HTTP {}", key, response.status);
        }

        Ok(Interception::Respond(response))
    }
}
