//! Spinners and download progress with CI fallback

use super::context::UiContext;
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};

static DONE: Emoji<'_, '_> = Emoji("✓", "[OK]");
static FAILED: Emoji<'_, '_> = Emoji("✗", "[FAIL]");
static WARNED: Emoji<'_, '_> = Emoji("!", "[WARN]");

/// A spinner around one long-running step
///
/// Falls back to a start line and a tagged result line when not
/// interactive.
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        if !self.interactive {
            println!("{} {}", style("...").dim(), message);
            return;
        }
        let spinner = cliclack::spinner();
        spinner.start(message);
        self.spinner = Some(spinner);
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style(DONE).green(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style(FAILED).red(), message),
        }
    }

    pub fn stop_warn(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(style(message).yellow()),
            None => println!("{} {}", style(WARNED).yellow(), message),
        }
    }
}

/// Per-file progress for shell downloads
///
/// An indicatif bar when interactive; one line per file otherwise.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    pub fn new(ctx: &UiContext, label: &str, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            let template = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(template);
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("{} ({} file(s))...", label, total);
            None
        };
        Self { bar }
    }

    /// Record a finished download
    pub fn on_file(&self, done: usize, total: usize, path: &str) {
        match self.bar {
            Some(ref bar) => {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
                bar.set_message(shorten(path, 48));
            }
            None => println!("  [{}/{}] {}", done, total, path),
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Keep the tail of long paths, which carries the file name
fn shorten(path: &str, max: usize) -> String {
    let count = path.chars().count();
    if count <= max {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (max - 3)).collect();
    format!("...{}", tail)
}
