//! Blocking HTTP client run on the tokio blocking pool

use super::Fetcher;
use crate::config::schema::NetworkConfig;
use crate::error::{BundleError, BundleResult};
use crate::http::{CacheMode, Method, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Largest body accepted from the network
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// [`Fetcher`] backed by `ureq`
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    /// Build a client from network settings
    pub fn new(config: &NetworkConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    fn execute(&self, request: &Request) -> BundleResult<Response> {
        let url = request.url.as_str();
        let mut response = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(url).header("User-Agent", &self.user_agent);
                if request.cache_mode == CacheMode::Reload {
                    builder = builder
                        .header("Cache-Control", "no-cache")
                        .header("Pragma", "no-cache");
                }
                builder.call()
            }
            Method::Head => self
                .agent
                .head(url)
                .header("User-Agent", &self.user_agent)
                .call(),
            other => {
                return Err(BundleError::network(
                    url,
                    format!("method {} is not supported by the fetcher", other),
                ))
            }
        }
        .map_err(|e| BundleError::network(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = if request.method == Method::Head {
            Vec::new()
        } else {
            response
                .body_mut()
                .with_config()
                .limit(MAX_BODY_BYTES)
                .read_to_vec()
                .map_err(|e| BundleError::network(url, format!("reading body: {}", e)))?
        };

        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> BundleResult<Response> {
        let fetcher = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || fetcher.execute(&request))
            .await
            .map_err(|e| BundleError::Internal(format!("Fetch task failed: {}", e)))?
    }
}
