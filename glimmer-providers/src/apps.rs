use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use freedesktop_desktop_entry::DesktopEntry;
use glimmer_core::config::expand_tilde;
use glimmer_core::{CacheStore, Config, Provider, Provision, ResultItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One indexed application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEntry {
    pub name: String,
    pub exec: String,
    /// Icon name, kept for front-ends even though the engine never loads it.
    pub icon: Option<String>,
    pub path: PathBuf,
}

/// Searches the application index built from the configured desktop paths.
///
/// The scan result is persisted in the cache store and only rebuilt when the
/// key is missing or the cache was cleared. Empty queries return the
/// configured favorites in index order; non-empty queries match the name or
/// the launch command case-insensitively.
pub struct ApplicationProvider {
    entries: Vec<AppEntry>,
    favorites: Vec<String>,
}

impl ApplicationProvider {
    pub fn new(config: &Config, cache: &CacheStore) -> Self {
        let paths = config.desktop_paths.clone();
        let entries = cache.load_or_build("applications", || scan_applications(&paths));
        Self {
            entries,
            favorites: config.favorite_apps.clone(),
        }
    }

    #[cfg(test)]
    fn from_entries(entries: Vec<AppEntry>, favorites: Vec<String>) -> Self {
        Self { entries, favorites }
    }
}

impl Provider for ApplicationProvider {
    fn name(&self) -> &'static str {
        "applications"
    }

    fn provide(&self, query: &str) -> Result<Provision> {
        let mut items = Vec::new();

        if query.is_empty() {
            for app in &self.entries {
                if self.favorites.contains(&app.name) {
                    items.push(ResultItem::application(&app.name, &app.path));
                }
            }
        } else {
            let needle = query.to_lowercase();
            for app in &self.entries {
                if app.name.to_lowercase().contains(&needle)
                    || app.exec.to_lowercase().contains(&needle)
                {
                    items.push(ResultItem::application(&app.name, &app.path));
                }
            }
        }

        Ok(Provision::fall_through(items))
    }
}

/// Recursively scan the given directories for displayable .desktop entries.
/// Unreadable files and directories are skipped; duplicates (same file name
/// in a later directory) are dropped.
pub fn scan_applications(desktop_paths: &[PathBuf]) -> Vec<AppEntry> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for dir in desktop_paths {
        let dir = expand_tilde(&dir.to_string_lossy());
        for file in WalkDir::new(&dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "desktop"))
        {
            match parse_desktop_file(file.path()) {
                Ok(Some(app)) => {
                    let id = file.file_name().to_string_lossy().into_owned();
                    if seen.insert(id) {
                        entries.push(app);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    debug!("skipping {}: {err:#}", file.path().display());
                }
            }
        }
    }

    info!("indexed {} applications", entries.len());
    entries
}

fn parse_desktop_file(path: &Path) -> Result<Option<AppEntry>> {
    let contents = fs::read_to_string(path)?;
    let entry = DesktopEntry::decode(path, &contents)?;

    if entry.no_display() || entry.type_() != Some("Application") {
        return Ok(None);
    }
    let Some(name) = entry.name(None) else {
        return Ok(None);
    };

    Ok(Some(AppEntry {
        name: name.to_string(),
        exec: entry.exec().unwrap_or_default().to_string(),
        icon: entry.icon().map(str::to_string),
        path: path.to_path_buf(),
    }))
}

#[cfg(test)]
mod tests {
    use glimmer_core::Control;

    use super::*;

    fn entry(name: &str, exec: &str) -> AppEntry {
        AppEntry {
            name: name.to_string(),
            exec: exec.to_string(),
            icon: None,
            path: PathBuf::from(format!("/apps/{name}.desktop")),
        }
    }

    fn labels(provision: &Provision) -> Vec<&str> {
        provision.items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_favorites_in_index_order() {
        let provider = ApplicationProvider::from_entries(
            vec![
                entry("Zim", "zim"),
                entry("Files", "dolphin"),
                entry("Editor", "kate"),
                entry("Terminal", "konsole"),
            ],
            vec!["Terminal".to_string(), "Files".to_string()],
        );

        let provision = provider.provide("").unwrap();
        assert_eq!(labels(&provision), ["Files", "Terminal"]);
        assert_eq!(provision.control, Control::Continue);
    }

    #[test]
    fn matches_name_or_exec_case_insensitively() {
        let provider = ApplicationProvider::from_entries(
            vec![entry("Files", "dolphin"), entry("Editor", "kate")],
            Vec::new(),
        );

        assert_eq!(labels(&provider.provide("FILE").unwrap()), ["Files"]);
        assert_eq!(labels(&provider.provide("dolph").unwrap()), ["Files"]);
        assert_eq!(labels(&provider.provide("kat").unwrap()), ["Editor"]);
        assert!(provider.provide("nope").unwrap().items.is_empty());
    }

    #[test]
    fn scan_skips_hidden_entries_and_non_desktop_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("shown.desktop"),
            "[Desktop Entry]\nType=Application\nName=Shown\nExec=shown\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("hidden.desktop"),
            "[Desktop Entry]\nType=Application\nName=Hidden\nExec=hidden\nNoDisplay=true\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not a desktop file").unwrap();

        let entries = scan_applications(&[dir.path().to_path_buf()]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Shown");
        assert_eq!(entries[0].exec, "shown");
    }

    #[test]
    fn scan_survives_a_missing_directory() {
        let entries = scan_applications(&[PathBuf::from("/definitely/not/here")]);
        assert!(entries.is_empty());
    }
}
