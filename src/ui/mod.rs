//! Terminal output for the CLI
//!
//! Uses `cliclack` for interactive sessions and falls back to plain,
//! prefix-tagged lines (`[OK]`, `[WARN]`, ...) in CI or when piped.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, outro_warn, section, step_error,
    step_info, step_ok, step_ok_detail, step_warn_hint,
};
pub use progress::{DownloadProgress, TaskSpinner};
pub use prompts::confirm;
