//! Worker lifecycle state machine
//!
//! The host drives the worker through explicit transitions:
//!
//! ```text
//! Parsed --install--> Installing --ok--> Installed --activate--> Activating --> Activated
//!                                \--err--> Redundant
//! ```
//!
//! Fetch handling and offline downloads need an activated worker; a
//! waiting (installed) worker still accepts `skipWaiting`.

use super::control::{ensure_cached, ControlMessage, MessageOutcome};
use super::interceptor::{Interception, Interceptor};
use super::prefetch::ShellPrefetcher;
use super::reconcile::{ActivationOutcome, Reconciler};
use super::WorkerConfig;
use crate::error::{BundleError, BundleResult};
use crate::fetch::Fetcher;
use crate::http::Request;
use crate::store::CacheStorage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, nothing downloaded yet
    Parsed,
    /// Shell prefetch in progress
    Installing,
    /// Shell files staged, waiting to activate
    Installed,
    /// Reconciliation in progress
    Activating,
    /// Serving requests
    Activated,
    /// Install failed; this worker will never serve
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// Result of a successful install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Shell files staged
    pub staged: usize,
    /// Whether the worker asked to skip waiting for older workers
    pub skip_waiting: bool,
}

/// A worker for one deployed bundle version
pub struct Worker {
    config: Arc<WorkerConfig>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl Worker {
    /// Create a worker that has not installed yet
    pub fn new(
        config: Arc<WorkerConfig>,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::restore(config, storage, fetcher, WorkerState::Parsed)
    }

    /// Recreate a worker whose earlier transitions ran in another process
    ///
    /// Stores persist across restarts, so a host may install in one run and
    /// activate or serve in a later one.
    pub fn restore(
        config: Arc<WorkerConfig>,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        state: WorkerState,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
            state,
            skip_waiting: false,
            clients_claimed: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Whether immediate activation was requested
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Whether the worker took control of open clients on activation
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    fn require(&self, expected: WorkerState, action: &str) -> BundleResult<()> {
        if self.state != expected {
            return Err(BundleError::InvalidState {
                action: action.to_string(),
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Prefetch the shell files into staging
    pub async fn install(&mut self) -> BundleResult<InstallReport> {
        self.install_with_progress(&|_, _, _| {}).await
    }

    /// Install, reporting each downloaded shell file
    pub async fn install_with_progress(
        &mut self,
        on_progress: &(dyn Fn(usize, usize, &str) + Send + Sync),
    ) -> BundleResult<InstallReport> {
        self.require(WorkerState::Parsed, "install")?;
        self.state = WorkerState::Installing;
        self.skip_waiting = true;

        let prefetcher = ShellPrefetcher::new(&self.config, &*self.storage, &*self.fetcher);
        match prefetcher.run_with_progress(on_progress).await {
            Ok(staged) => {
                self.state = WorkerState::Installed;
                Ok(InstallReport {
                    staged,
                    skip_waiting: self.skip_waiting,
                })
            }
            Err(e) => {
                warn!("Install failed: {}", e);
                self.state = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    /// Reconcile the stores and start serving
    ///
    /// Reconciliation failures do not fail activation: they purge the stores
    /// and the worker serves from the network until the next upgrade.
    pub async fn activate(&mut self) -> BundleResult<ActivationOutcome> {
        self.require(WorkerState::Installed, "activate")?;
        self.state = WorkerState::Activating;

        let outcome = Reconciler::new(&self.config, &*self.storage).run().await;
        self.clients_claimed = outcome.claims_clients();
        self.state = WorkerState::Activated;

        info!("Worker activated ({})", outcome);
        Ok(outcome)
    }

    /// Offer a request to the worker
    pub async fn handle_fetch(&self, request: &Request) -> BundleResult<Interception> {
        self.require(WorkerState::Activated, "handle requests")?;
        Interceptor::new(&self.config, &*self.storage, &*self.fetcher)
            .handle(request)
            .await
    }

    /// Handle a raw control message
    ///
    /// A waiting (installed) worker accepts `skipWaiting`; downloads need an
    /// activated worker.
    pub async fn handle_message(&mut self, message: &str) -> BundleResult<MessageOutcome> {
        if !matches!(self.state, WorkerState::Installed | WorkerState::Activated) {
            return Err(BundleError::InvalidState {
                action: "handle messages".to_string(),
                state: self.state.to_string(),
            });
        }
        match message.parse::<ControlMessage>() {
            Ok(ControlMessage::SkipWaiting) => {
                self.skip_waiting = true;
                Ok(MessageOutcome::SkipWaiting)
            }
            Ok(ControlMessage::DownloadOffline) => {
                self.require(WorkerState::Activated, "download for offline use")?;
                let stored = ensure_cached(&self.config, &*self.storage, &*self.fetcher).await?;
                Ok(MessageOutcome::Downloaded { stored })
            }
            Err(_) => {
                debug!("Ignoring message {:?}", message);
                Ok(MessageOutcome::Ignored)
            }
        }
    }
}
