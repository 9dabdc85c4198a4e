//! Install command - stage the shell files

use super::Host;
use crate::config::Config;
use crate::error::BundleResult;
use crate::journal::{Journal, JournalEvent};
use crate::ui::{self, DownloadProgress, UiContext};
use crate::worker::{InstallReport, Worker, WorkerState};

/// Execute the install command
pub async fn execute(config: &Config) -> BundleResult<()> {
    let ctx = UiContext::detect();
    let journal = Journal::new(config);
    let host = Host::load(config).await?;
    let mut worker = host.worker(WorkerState::Parsed);

    ui::intro(&ctx, "Install");
    install(&ctx, &journal, &mut worker).await?;
    ui::outro_success(&ctx, "Ready to activate");
    Ok(())
}

/// Run the install transition with progress and journaling
pub(crate) async fn install(
    ctx: &UiContext,
    journal: &Journal,
    worker: &mut Worker,
) -> BundleResult<InstallReport> {
    let total = worker.config().bundle.shell.len();
    let version = worker.config().bundle.version.clone();
    let progress = DownloadProgress::new(ctx, "Prefetching shell", total);

    let result = worker
        .install_with_progress(&|done, total, path| progress.on_file(done, total, path))
        .await;
    progress.finish();

    match result {
        Ok(report) => {
            journal
                .record(&JournalEvent::InstallOk {
                    version,
                    staged: report.staged,
                })
                .await;
            ui::step_ok_detail(
                ctx,
                "Shell staged",
                &format!("{} file(s)", report.staged),
            );
            Ok(report)
        }
        Err(e) => {
            journal
                .record(&JournalEvent::InstallFailed {
                    version,
                    error: e.to_string(),
                })
                .await;
            ui::step_error(ctx, "Install failed; this version will not be served");
            Err(e)
        }
    }
}
