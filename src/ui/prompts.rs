//! Confirmation prompt with non-interactive fallback

use super::context::UiContext;
use crate::error::{BundleError, BundleResult};

/// Ask a yes/no question
///
/// Returns `true` under `--yes`, and `default` when not attached to a
/// terminal.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> BundleResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| BundleError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| BundleError::User(format!("Prompt failed: {}", e)))
}
