//! Fetch command - resolve one request through the worker

use super::Host;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{BundleError, BundleResult};
use crate::http::{Request, Response};
use crate::keys;
use crate::worker::{Interception, WorkerState};
use std::io::Write;
use tracing::info;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> BundleResult<()> {
    let host = Host::load(config).await?;
    let worker = host.worker(WorkerState::Activated);
    let url = absolute_url(&host.config.origin, &args.url);
    let request = Request::get(url.as_str());

    let response = match worker.handle_fetch(&request).await? {
        Interception::Respond(response) => response,
        Interception::Passthrough => {
            info!("{} is not managed, fetching directly", url);
            host.fetcher.fetch(&request).await?
        }
    };

    if !response.is_ok() {
        return Err(BundleError::User(format!(
            "{} answered HTTP {}",
            url, response.status
        )));
    }

    write_body(&response, args.output.as_deref()).await
}

/// Resolve a path against the origin; absolute URLs pass through
fn absolute_url(origin: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }
    match target.trim_start_matches('/') {
        "" => keys::resolve(origin, keys::ROOT_KEY),
        path => keys::resolve(origin, path),
    }
}

async fn write_body(response: &Response, output: Option<&std::path::Path>) -> BundleResult<()> {
    match output {
        Some(path) => tokio::fs::write(path, &response.body)
            .await
            .map_err(|e| BundleError::io(format!("writing {}", path.display()), e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|_| stdout.flush())
                .map_err(|e| BundleError::io("writing response to stdout", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_targets_resolve_against_origin() {
        let origin = "https://app.test";
        assert_eq!(absolute_url(origin, "/"), "https://app.test/");
        assert_eq!(absolute_url(origin, ""), "https://app.test/");
        assert_eq!(absolute_url(origin, "/main.js"), "https://app.test/main.js");
        assert_eq!(absolute_url(origin, "assets/a.png"), "https://app.test/assets/a.png");
    }

    #[test]
    fn absolute_targets_pass_through() {
        assert_eq!(
            absolute_url("https://app.test", "https://cdn.test/lib.js"),
            "https://cdn.test/lib.js"
        );
    }
}
