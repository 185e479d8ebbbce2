use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use xdg::BaseDirectories;

/// Launcher configuration.
///
/// Stored as JSON; key spelling matches the config files this launcher has
/// always used, spaces included. A missing file is created with the
/// defaults; a corrupt file logs the fault and falls back to the defaults.
/// Loading never aborts startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories scanned for .desktop entries.
    #[serde(rename = "desktop paths")]
    pub desktop_paths: Vec<PathBuf>,

    /// Application names shown for the empty query.
    #[serde(rename = "favorite apps")]
    pub favorite_apps: Vec<String>,

    /// Directory whose entries are listed alongside bookmarks on the empty
    /// query. Empty disables it.
    #[serde(rename = "favorites directory")]
    pub favorites_directory: String,

    /// Command that opens an application's desktop file.
    #[serde(rename = "open command")]
    pub open_command: String,

    /// Command that opens a directory.
    #[serde(rename = "file manager command")]
    pub file_manager_command: String,

    /// Command that selects a file in the file manager without opening it.
    #[serde(rename = "reveal in file manager command")]
    pub reveal_command: String,

    /// Font for calculator output rows; consumed by the UI layer.
    #[serde(rename = "monospace font")]
    pub monospace_font: String,

    /// Result icon size in pixels; consumed by the UI layer.
    #[serde(rename = "icon size")]
    pub icon_size: u32,

    /// Whether the window background is translucent; consumed by the UI
    /// layer.
    #[serde(rename = "translucent background")]
    pub translucent_background: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            desktop_paths: default_desktop_paths(),
            favorite_apps: Vec::new(),
            favorites_directory: String::new(),
            open_command: "exo-open".to_string(),
            file_manager_command: "dolphin".to_string(),
            reveal_command: "dolphin --select".to_string(),
            monospace_font: "monospace".to_string(),
            icon_size: 48,
            translucent_background: true,
        }
    }
}

/// XDG data dirs joined with `applications`, or the conventional literal
/// list when the XDG environment is unusable.
fn default_desktop_paths() -> Vec<PathBuf> {
    if let Ok(xdg_dirs) = BaseDirectories::new() {
        let mut dirs = vec![xdg_dirs.get_data_home()];
        dirs.extend(xdg_dirs.get_data_dirs());
        return dirs.into_iter().map(|p| p.join("applications")).collect();
    }
    [
        "/usr/share/applications",
        "/usr/local/share/applications",
        "~/.local/share/applications",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("no config directory for this user")?;
        Ok(base.join("glimmer").join("config.json"))
    }

    /// Load the configuration, writing the defaults on first run.
    pub fn load(path: &Path) -> Config {
        if !path.exists() {
            if let Err(err) = write_default(path) {
                warn!("could not write default config to {}: {err:#}", path.display());
            }
        }

        let parsed = fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from));
        match parsed {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "could not read config at {}: {err:#}; using defaults",
                    path.display()
                );
                Config::default()
            }
        }
    }
}

fn write_default(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(&Config::default())?;
    fs::write(path, raw)?;
    Ok(())
}

/// Expand a leading `~` to the user's home directory. Everything else is
/// taken literally.
pub fn expand_tilde(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if input == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(input)
}
