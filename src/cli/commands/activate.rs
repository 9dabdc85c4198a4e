//! Activate command - reconcile the stores

use super::Host;
use crate::config::Config;
use crate::error::BundleResult;
use crate::journal::{Journal, JournalEvent};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::{ActivationOutcome, Worker, WorkerState};

/// Execute the activate command
///
/// Assumes the current bundle was installed by an earlier run.
pub async fn execute(config: &Config) -> BundleResult<()> {
    let ctx = UiContext::detect();
    let journal = Journal::new(config);
    let host = Host::load(config).await?;
    let mut worker = host.worker(WorkerState::Installed);

    ui::intro(&ctx, "Activate");
    let outcome = activate(&ctx, &journal, &mut worker).await?;
    finish(&ctx, &outcome);
    Ok(())
}

/// Run the activate transition with a spinner and journaling
pub(crate) async fn activate(
    ctx: &UiContext,
    journal: &Journal,
    worker: &mut Worker,
) -> BundleResult<ActivationOutcome> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start("Reconciling stores...");

    let outcome = match worker.activate().await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error("Activation refused");
            return Err(e);
        }
    };

    journal
        .record(&JournalEvent::Activated {
            version: worker.config().bundle.version.clone(),
            outcome: outcome.clone(),
        })
        .await;

    match outcome {
        ActivationOutcome::Purged { .. } => spinner.stop_warn("Stores purged"),
        _ => spinner.stop("Stores reconciled"),
    }
    Ok(outcome)
}

/// Print the summary for an activation
pub(crate) fn finish(ctx: &UiContext, outcome: &ActivationOutcome) {
    match outcome {
        ActivationOutcome::ColdStart { copied } => {
            ui::key_value(ctx, "Mode", "cold start");
            ui::key_value(ctx, "Shell cached", &copied.to_string());
            ui::outro_success(ctx, "Activated");
        }
        ActivationOutcome::WarmUpgrade {
            retained,
            evicted,
            copied,
        } => {
            ui::key_value(ctx, "Mode", "upgrade");
            ui::key_value(ctx, "Retained", &retained.to_string());
            ui::key_value(ctx, "Evicted", &evicted.to_string());
            ui::key_value(ctx, "Shell cached", &copied.to_string());
            ui::outro_success(ctx, "Activated");
        }
        ActivationOutcome::Purged { reason } => {
            ui::step_warn_hint(
                ctx,
                reason,
                "Requests go to the network until the next upgrade",
            );
            ui::outro_warn(ctx, "Activated without cache");
        }
    }
}
