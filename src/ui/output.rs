//! Line-oriented status output

use super::context::UiContext;
use console::{style, Style};

#[derive(Debug, Clone, Copy)]
enum Level {
    Ok,
    Info,
    Warn,
    Fail,
}

impl Level {
    fn tag(self) -> String {
        match self {
            Self::Ok => style("[OK]").green().to_string(),
            Self::Info => style("[INFO]").cyan().to_string(),
            Self::Warn => style("[WARN]").yellow().to_string(),
            Self::Fail => style("[FAIL]").red().to_string(),
        }
    }
}

/// One indented step line, through cliclack's log when interactive
fn step(ctx: &UiContext, level: Level, message: &str) {
    if !ctx.use_fancy_output() {
        println!("  {} {}", level.tag(), message);
        return;
    }
    let _ = match level {
        Level::Ok => cliclack::log::success(message),
        Level::Info => cliclack::log::info(message),
        Level::Warn => cliclack::log::warning(message),
        Level::Fail => cliclack::log::error(message),
    };
}

fn outro(ctx: &UiContext, level: Level, message: &str) {
    if ctx.use_fancy_output() {
        let styled = match level {
            Level::Warn => style(message).yellow().bold(),
            _ => style(message).green().bold(),
        };
        let _ = cliclack::outro(styled);
    } else {
        println!();
        println!("{} {}", level.tag(), message);
    }
}

/// Command banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        let _ = cliclack::intro(style(title).cyan().bold());
    } else {
        println!("{}", style(title).cyan().bold());
        println!();
    }
}

pub fn outro_success(ctx: &UiContext, message: &str) {
    outro(ctx, Level::Ok, message);
}

pub fn outro_warn(ctx: &UiContext, message: &str) {
    outro(ctx, Level::Warn, message);
}

/// Bold header separating groups of lines
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        let _ = cliclack::log::info(style(title).bold());
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    step(ctx, Level::Ok, message);
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    let detail = if ctx.use_fancy_output() {
        style(detail).dim().to_string()
    } else {
        detail.to_string()
    };
    step(ctx, Level::Ok, &format!("{} ({})", message, detail));
}

pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    let hint = if ctx.use_fancy_output() {
        style(hint).dim().to_string()
    } else {
        hint.to_string()
    };
    step(ctx, Level::Warn, &format!("{} - {}", message, hint));
}

pub fn step_error(ctx: &UiContext, message: &str) {
    step(ctx, Level::Fail, message);
}

pub fn step_info(ctx: &UiContext, message: &str) {
    step(ctx, Level::Info, message);
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

/// Key-value pair colored by health
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    if !ctx.use_fancy_output() {
        let level = if ok { Level::Ok } else { Level::Warn };
        println!("  {} {}: {}", level.tag(), key, value);
        return;
    }
    let value_style = if ok {
        Style::new().green()
    } else {
        Style::new().yellow()
    };
    println!("  {}: {}", style(key).dim(), value_style.apply_to(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_non_interactive() {
        let ctx = UiContext::non_interactive();
        intro(&ctx, "Activate");
        section(&ctx, "Stores");
        key_value(&ctx, "origin", "https://app.test");
        key_value_status(&ctx, "record", "missing", false);
        step_ok(&ctx, "Shell staged");
        step_ok_detail(&ctx, "Shell staged", "2 file(s)");
        step_warn_hint(&ctx, "Stores purged", "next activation is a cold start");
        step_error(&ctx, "Install failed");
        step_info(&ctx, "Nothing deleted");
        outro_success(&ctx, "Activated");
        outro_warn(&ctx, "Activated without cache");
    }

    #[test]
    fn plain_tags() {
        assert!(Level::Ok.tag().contains("[OK]"));
        assert!(Level::Fail.tag().contains("[FAIL]"));
    }
}
