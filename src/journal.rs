//! Lifecycle journal
//!
//! Appends one JSON line per [`JournalEvent`] to
//! `~/.local/state/bundlecache/journal.log`, so upgrades and purges can be
//! traced after the fact:
//!
//! ```text
//! {"timestamp":"...","run":"<uuid>","event":"activate.warm_upgrade","data":{"version":"2","outcome":{...}}}
//! ```

use crate::config::{schema::Config, ConfigManager};
use crate::worker::{ActivationOutcome, MessageOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// Something that happened to the stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JournalEvent {
    InstallOk {
        version: Option<String>,
        staged: usize,
    },
    InstallFailed {
        version: Option<String>,
        error: String,
    },
    Activated {
        version: Option<String>,
        outcome: ActivationOutcome,
    },
    MessageHandled {
        outcome: MessageOutcome,
    },
    MessageFailed {
        message: String,
        error: String,
    },
    Purged {
        deleted: Vec<String>,
        failed: usize,
    },
}

impl JournalEvent {
    /// Dotted event name written to the `event` field
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstallOk { .. } => "install.ok",
            Self::InstallFailed { .. } => "install.failed",
            Self::Activated { outcome, .. } => match outcome {
                ActivationOutcome::ColdStart { .. } => "activate.cold_start",
                ActivationOutcome::WarmUpgrade { .. } => "activate.warm_upgrade",
                ActivationOutcome::Purged { .. } => "activate.purged",
            },
            Self::MessageHandled { outcome } => match outcome {
                MessageOutcome::SkipWaiting => "message.skip_waiting",
                MessageOutcome::Downloaded { .. } => "message.download_offline",
                MessageOutcome::Ignored => "message.ignored",
            },
            Self::MessageFailed { .. } => "message.failed",
            Self::Purged { .. } => "purge",
        }
    }
}

#[derive(Serialize)]
struct Entry<'a> {
    timestamp: DateTime<Utc>,
    run: Uuid,
    event: &'static str,
    data: &'a JournalEvent,
}

/// Append-only journal of lifecycle events
pub struct Journal {
    enabled: bool,
    path: PathBuf,
    run_id: Uuid,
}

impl Journal {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.journal,
            path: ConfigManager::journal_path(),
            run_id: Uuid::new_v4(),
        }
    }

    /// Identifier shared by every event of this process
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append an event; IO failures are logged and dropped
    pub async fn record(&self, event: &JournalEvent) {
        if !self.enabled {
            return;
        }

        let entry = Entry {
            timestamp: Utc::now(),
            run: self.run_id,
            event: event.name(),
            data: event,
        };
        let line = match serde_json::to_string(&entry) {
            Ok(json) => json + "\n",
            Err(e) => {
                warn!("Failed to serialize journal event {}: {}", event.name(), e);
                return;
            }
        };

        if let Err(e) = self.append(line.as_bytes()).await {
            warn!("Failed to write journal {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line).await?;
        file.flush().await
    }
}
