//! Upgrade command - install then activate

use super::activate::{activate, finish};
use super::install::install;
use super::Host;
use crate::config::Config;
use crate::error::BundleResult;
use crate::journal::Journal;
use crate::ui::{self, UiContext};
use crate::worker::WorkerState;

/// Execute the upgrade command
pub async fn execute(config: &Config) -> BundleResult<()> {
    let ctx = UiContext::detect();
    let journal = Journal::new(config);
    let host = Host::load(config).await?;
    let mut worker = host.worker(WorkerState::Parsed);

    let title = match worker.config().bundle.version {
        Some(ref version) => format!("Upgrade to {}", version),
        None => "Upgrade".to_string(),
    };
    ui::intro(&ctx, &title);

    install(&ctx, &journal, &mut worker).await?;
    let outcome = activate(&ctx, &journal, &mut worker).await?;
    finish(&ctx, &outcome);
    Ok(())
}
