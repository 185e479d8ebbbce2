use std::ffi::OsStr;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::Config;
use crate::item::{ItemKind, ResultItem};

/// What activating an item amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// An external handler was spawned; the launcher window may close.
    Spawned,
    /// The item asks for the provider cache to be cleared; the caller owns
    /// that flow (clear the store, reload config, rebuild the chain).
    ResetCache,
    /// The item is display-only and nothing happened.
    Ignored,
}

/// Activate a result item by spawning the appropriate external handler.
///
/// Fire-and-forget: a spawned handler is never waited on and its success is
/// not guaranteed. Spawn faults are reported to the caller, which logs them;
/// they are never fatal.
pub fn activate(item: &ResultItem, config: &Config) -> Result<Activation> {
    match &item.kind {
        ItemKind::Application { desktop_file } => {
            spawn_template(&config.open_command, Some(desktop_file.as_os_str()))?;
        }
        ItemKind::File { path } => {
            if path.is_dir() {
                // Open folders as-is.
                spawn_template(&config.file_manager_command, Some(path.as_os_str()))?;
            } else {
                // Select files without opening their respective program.
                spawn_template(&config.reveal_command, Some(path.as_os_str()))?;
            }
        }
        ItemKind::Url { url } => {
            Command::new("x-www-browser")
                .arg(url)
                .spawn()
                .context("could not spawn x-www-browser")?;
        }
        ItemKind::Executable { command_line } => {
            Command::new("sh")
                .arg("-c")
                .arg(command_line)
                .spawn()
                .with_context(|| format!("could not run `{command_line}`"))?;
        }
        ItemKind::Window { id } => {
            Command::new("wmctrl")
                .args(["-i", "-a"])
                .arg(id)
                .spawn()
                .context("could not spawn wmctrl")?;
        }
        ItemKind::CacheReset => return Ok(Activation::ResetCache),
        ItemKind::Text => {
            warn!("item '{}' cannot be opened", item.label);
            return Ok(Activation::Ignored);
        }
    }
    Ok(Activation::Spawned)
}

/// Spawn a whitespace-split command template with one trailing argument.
fn spawn_template(template: &str, arg: Option<&OsStr>) -> Result<()> {
    let mut parts = template.split_whitespace();
    let program = parts
        .next()
        .with_context(|| format!("empty command template `{template}`"))?;

    let mut command = Command::new(program);
    command.args(parts);
    if let Some(arg) = arg {
        command.arg(arg);
    }
    command
        .spawn()
        .with_context(|| format!("could not spawn `{template}`"))?;
    Ok(())
}
