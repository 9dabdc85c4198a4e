//! Message command - deliver a control message

use super::Host;
use crate::cli::args::MessageArgs;
use crate::config::Config;
use crate::error::BundleResult;
use crate::journal::{Journal, JournalEvent};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::{ControlMessage, MessageOutcome, WorkerState};

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config) -> BundleResult<()> {
    let ctx = UiContext::detect();
    let journal = Journal::new(config);
    let host = Host::load(config).await?;
    let mut worker = host.worker(WorkerState::Activated);
    let message = ControlMessage::from(args.message);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Delivering {}...", message));

    let outcome = match worker.handle_message(message.as_str()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            spinner.stop_error(&format!("{} failed", message));
            journal
                .record(&JournalEvent::MessageFailed {
                    message: message.to_string(),
                    error: e.to_string(),
                })
                .await;
            return Err(e);
        }
    };

    journal
        .record(&JournalEvent::MessageHandled {
            outcome: outcome.clone(),
        })
        .await;

    match outcome {
        MessageOutcome::SkipWaiting => spinner.stop("Skip-waiting requested"),
        MessageOutcome::Downloaded { stored: 0 } => spinner.stop("Everything already cached"),
        MessageOutcome::Downloaded { stored } => {
            spinner.stop(&format!("Cached {} resource(s) for offline use", stored))
        }
        MessageOutcome::Ignored => {
            spinner.stop_warn("Message ignored");
            ui::step_info(&ctx, "The worker does not understand this message");
        }
    }
    Ok(())
}
