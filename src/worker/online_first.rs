//! Network-first strategy for the entry document

use crate::error::BundleResult;
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::store::CacheStorage;
use tracing::{debug, warn};

/// Try the network, fall back to the content store
///
/// A network response of any status is stored and returned. On a transport
/// failure the cached copy is returned if there is one; otherwise the
/// original network error is returned.
pub async fn online_first(
    storage: &dyn CacheStorage,
    content_store: &str,
    fetcher: &dyn Fetcher,
    request: &Request,
) -> BundleResult<Response> {
    let network_err = match fetcher.fetch(request).await {
        Ok(response) => {
            if let Err(e) = store_copy(storage, content_store, request, &response).await {
                warn!("Failed to cache {}: {}", request.url, e);
            }
            return Ok(response);
        }
        Err(e) => e,
    };

    debug!("Network failed for {}, trying cache: {}", request.url, network_err);
    let cached = match storage.open(content_store).await {
        Ok(store) => store.get(&request.url).await,
        Err(e) => Err(e),
    };

    match cached {
        Ok(Some(response)) => Ok(response),
        Ok(None) => Err(network_err),
        Err(e) => {
            warn!("Cache lookup for {} failed: {}", request.url, e);
            Err(network_err)
        }
    }
}

async fn store_copy(
    storage: &dyn CacheStorage,
    content_store: &str,
    request: &Request,
    response: &Response,
) -> BundleResult<()> {
    let store = storage.open(content_store).await?;
    store.put(&request.url, response).await
}
