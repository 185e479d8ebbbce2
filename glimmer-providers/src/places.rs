use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use glimmer_core::config::expand_tilde;
use glimmer_core::{CacheStore, Config, Provider, Provision, ResultItem};
use globset::GlobBuilder;
use regex::Regex;
use tracing::debug;

/// Bookmarked places and directory completion.
///
/// Empty query: the file-manager bookmarks (sorted by title) followed by the
/// entries of the configured favorites directory, falling through so other
/// providers still contribute. Path-like query (leading `/` or `~`):
/// case-insensitive glob expansion of `<query>*`, directories only, and the
/// chain stops there. Anything else contributes nothing.
pub struct DirectoryProvider {
    /// Bookmark title -> path, sorted by title.
    bookmarks: BTreeMap<String, String>,
    favorites_directory: String,
}

impl DirectoryProvider {
    pub fn new(config: &Config, cache: &CacheStore) -> Self {
        let bookmarks = cache.load_or_build("places", || match bookmarks_path() {
            Some(path) => read_bookmarks(&path),
            None => BTreeMap::new(),
        });
        Self {
            bookmarks,
            favorites_directory: config.favorites_directory.clone(),
        }
    }

    #[cfg(test)]
    fn with_bookmarks(bookmarks: BTreeMap<String, String>, favorites_directory: String) -> Self {
        Self {
            bookmarks,
            favorites_directory,
        }
    }

    fn browse(&self) -> Vec<ResultItem> {
        let mut items = Vec::new();
        for (title, path) in &self.bookmarks {
            items.push(ResultItem::titled_file(title, path));
        }

        if !self.favorites_directory.is_empty() {
            let favorites = expand_tilde(&self.favorites_directory);
            // Files are listed too; revealing one is a useful activation.
            let mut paths: Vec<PathBuf> = fs::read_dir(&favorites)
                .map(|entries| {
                    entries
                        .filter_map(|entry| entry.ok())
                        .map(|entry| entry.path())
                        .collect()
                })
                .unwrap_or_default();
            paths.sort();
            items.extend(paths.into_iter().map(ResultItem::file));
        }

        items
    }
}

impl Provider for DirectoryProvider {
    fn name(&self) -> &'static str {
        "places"
    }

    fn provide(&self, query: &str) -> Result<Provision> {
        if query.is_empty() {
            return Ok(Provision::fall_through(self.browse()));
        }
        if !query.starts_with('/') && !query.starts_with('~') {
            return Ok(Provision::pass());
        }

        let matches = expand_path_prefix(&expand_tilde(query))?;
        Ok(Provision::stop(
            matches.into_iter().map(ResultItem::file).collect(),
        ))
    }
}

/// Case-insensitive expansion of `<prefix>*` against the prefix's parent
/// directory, keeping directories only, sorted.
fn expand_path_prefix(prefix: &Path) -> Result<Vec<PathBuf>> {
    let raw = prefix.to_string_lossy();
    let (parent, partial) = match raw.rfind('/') {
        Some(0) => ("/".to_string(), raw[1..].to_string()),
        Some(idx) => (raw[..idx].to_string(), raw[idx + 1..].to_string()),
        None => return Ok(Vec::new()),
    };

    let matcher = GlobBuilder::new(&format!("{partial}*"))
        .case_insensitive(true)
        .literal_separator(true)
        .build()?
        .compile_matcher();

    let Ok(entries) = fs::read_dir(&parent) else {
        return Ok(Vec::new());
    };
    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| matcher.is_match(entry.file_name()))
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    Ok(matches)
}

/// The freedesktop bookmark store used by KDE file dialogs and Dolphin.
fn bookmarks_path() -> Option<PathBuf> {
    dirs::data_dir().map(|base| base.join("user-places.xbel"))
}

fn read_bookmarks(path: &Path) -> BTreeMap<String, String> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_xbel(&contents),
        Err(err) => {
            debug!("no bookmark store at {}: {err}", path.display());
            BTreeMap::new()
        }
    }
}

/// Pull `(title, path)` pairs out of an XBEL bookmark file, skipping entries
/// hidden or scoped to a single application. Deliberately a shallow textual
/// pass, not an XML data model; the store format is glue, not a contract.
fn parse_xbel(contents: &str) -> BTreeMap<String, String> {
    let bookmark =
        Regex::new(r#"(?s)<bookmark[^>]*href="([^"]+)"[^>]*>(.*?)</bookmark>"#).expect("regex");
    let title = Regex::new(r"(?s)<title>(.*?)</title>").expect("regex");
    let hidden = Regex::new(r"<[^>]*IsHidden[^>]*>\s*true").expect("regex");

    let mut bookmarks = BTreeMap::new();
    for captures in bookmark.captures_iter(contents) {
        let body = &captures[2];
        if body.contains("OnlyInApp") || hidden.is_match(body) {
            continue;
        }
        let Some(title) = title.captures(body).map(|c| c[1].trim().to_string()) else {
            continue;
        };

        let mut href = captures[1].to_string();
        if let Some(local) = href.strip_prefix("file://") {
            href = local.to_string();
        }
        bookmarks.insert(title, href);
    }
    bookmarks
}

#[cfg(test)]
mod tests {
    use glimmer_core::{Control, ItemKind};

    use super::*;

    const XBEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xbel>
 <bookmark href="file:///home/user/Music">
  <title>Music</title>
 </bookmark>
 <bookmark href="file:///home/user/.hidden">
  <title>Hidden</title>
  <info><metadata><IsHidden>true</IsHidden></metadata></info>
 </bookmark>
 <bookmark href="file:///home/user/AppOnly">
  <title>App only</title>
  <info><metadata><OnlyInApp>dolphin</OnlyInApp></metadata></info>
 </bookmark>
 <bookmark href="file:///home/user/Archive">
  <title>Archive</title>
 </bookmark>
</xbel>
"#;

    #[test]
    fn xbel_parsing_skips_hidden_and_app_scoped_entries() {
        let bookmarks = parse_xbel(XBEL);
        assert_eq!(
            bookmarks.keys().collect::<Vec<_>>(),
            ["Archive", "Music"]
        );
        assert_eq!(bookmarks["Music"], "/home/user/Music");
    }

    #[test]
    fn empty_query_lists_bookmarks_then_favorites() {
        let favorites = tempfile::tempdir().unwrap();
        fs::create_dir(favorites.path().join("projects")).unwrap();
        fs::write(favorites.path().join("notes.txt"), "n").unwrap();

        let provider = DirectoryProvider::with_bookmarks(
            parse_xbel(XBEL),
            favorites.path().to_string_lossy().into_owned(),
        );

        let provision = provider.provide("").unwrap();
        let labels: Vec<&str> = provision.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels[..2], ["Archive", "Music"]);
        assert!(labels[2].ends_with("notes.txt"));
        assert!(labels[3].ends_with("projects"));
        assert_eq!(provision.control, Control::Continue);
    }

    #[test]
    fn path_queries_expand_case_insensitively_and_stop_the_chain() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Alpha")).unwrap();
        fs::create_dir(root.path().join("amber")).unwrap();
        fs::create_dir(root.path().join("beta")).unwrap();
        fs::write(root.path().join("article.txt"), "file, not dir").unwrap();

        let provider =
            DirectoryProvider::with_bookmarks(BTreeMap::new(), String::new());
        let query = format!("{}/a", root.path().display());
        let provision = provider.provide(&query).unwrap();

        let labels: Vec<&str> = provision.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].ends_with("Alpha"));
        assert!(labels[1].ends_with("amber"));
        assert_eq!(provision.control, Control::Stop);
        assert!(matches!(provision.items[0].kind, ItemKind::File { .. }));
    }

    #[test]
    fn a_path_query_with_no_matches_still_stops_the_chain() {
        let root = tempfile::tempdir().unwrap();
        let provider =
            DirectoryProvider::with_bookmarks(BTreeMap::new(), String::new());
        let query = format!("{}/zzz", root.path().display());

        let provision = provider.provide(&query).unwrap();
        assert!(provision.items.is_empty());
        assert_eq!(provision.control, Control::Stop);
    }

    #[test]
    fn non_path_queries_fall_through() {
        let provider =
            DirectoryProvider::with_bookmarks(BTreeMap::new(), String::new());
        let provision = provider.provide("firefox").unwrap();
        assert!(provision.items.is_empty());
        assert_eq!(provision.control, Control::Continue);
    }
}
