//! Network access
//!
//! The worker reaches the network only through the [`Fetcher`] trait so
//! that hosts can supply their own transport.

mod http;

pub use http::HttpFetcher;

use crate::error::BundleResult;
use crate::http::{Request, Response};
use async_trait::async_trait;

/// Performs a request against the network
///
/// Returns the response for any HTTP status; only transport failures
/// (DNS, refused connection, timeout) are errors, reported as
/// [`BundleError::Network`](crate::error::BundleError::Network).
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> BundleResult<Response>;
}
