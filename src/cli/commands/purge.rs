//! Purge command - delete every store

use super::open_storage;
use crate::cli::args::PurgeArgs;
use crate::config::Config;
use crate::error::BundleResult;
use crate::journal::{Journal, JournalEvent};
use crate::ui::{self, UiContext};
use tracing::warn;

/// Execute the purge command
///
/// Each store is deleted independently; a failure on one does not stop the
/// others.
pub async fn execute(args: PurgeArgs, config: &Config) -> BundleResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let names = &config.stores.names;

    if !ui::confirm(
        &ctx,
        "Delete the content, staging and manifest stores?",
        false,
    )
    .await?
    {
        ui::step_info(&ctx, "Nothing deleted");
        return Ok(());
    }

    let storage = open_storage(config);
    let mut deleted = Vec::new();
    let mut failed = 0usize;

    for name in [&names.content, &names.staging, &names.manifest] {
        match storage.delete(name).await {
            Ok(true) => {
                ui::step_ok(&ctx, &format!("Deleted {}", name));
                deleted.push(name.clone());
            }
            Ok(false) => ui::step_info(&ctx, &format!("{} did not exist", name)),
            Err(e) => {
                warn!("Failed to delete store {}: {}", name, e);
                ui::step_error(&ctx, &format!("Could not delete {}: {}", name, e));
                failed += 1;
            }
        }
    }

    Journal::new(config)
        .record(&JournalEvent::Purged { deleted, failed })
        .await;

    if failed > 0 {
        ui::outro_warn(&ctx, "Some stores could not be deleted");
    } else {
        ui::outro_success(&ctx, "Stores purged; next activation is a cold start");
    }
    Ok(())
}
