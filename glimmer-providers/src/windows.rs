use std::process::Command;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use glimmer_core::{Provider, Provision, ResultItem, WINDOW_TITLE};
use tracing::warn;

/// How long a window snapshot may be served before `wmctrl` is asked again.
const STALE_AFTER: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
struct WindowEntry {
    id: String,
    workspace: String,
    title: String,
}

#[derive(Debug)]
struct Snapshot {
    taken: Instant,
    windows: Vec<WindowEntry>,
    /// Sometimes no workspace is marked active (i3 with a freshly connected
    /// monitor); the empty-query contribution is empty then.
    active_workspace: Option<String>,
}

/// Lists open windows from a `wmctrl` snapshot refreshed at most once per
/// staleness interval, not on every keystroke.
///
/// Empty query: windows on the active workspace. Non-empty: title substring
/// match across all workspaces. The launcher's own window is excluded by
/// title. Always falls through.
pub struct OpenWindowProvider {
    snapshot: Mutex<Option<Snapshot>>,
    own_title: &'static str,
}

impl OpenWindowProvider {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(None),
            own_title: WINDOW_TITLE,
        }
    }
}

impl Default for OpenWindowProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for OpenWindowProvider {
    fn name(&self) -> &'static str {
        "open-windows"
    }

    fn provide(&self, query: &str) -> Result<Provision> {
        let mut snapshot = self.snapshot.lock().expect("window snapshot poisoned");

        let stale = snapshot
            .as_ref()
            .is_none_or(|snap| snap.taken.elapsed() > STALE_AFTER);
        if stale {
            match take_snapshot() {
                Ok(fresh) => *snapshot = Some(fresh),
                Err(err) if snapshot.is_some() => {
                    // Serve the stale snapshot rather than nothing.
                    warn!("window snapshot refresh failed: {err:#}");
                }
                Err(err) => return Err(err),
            }
        }
        let snap = snapshot.as_ref().expect("snapshot populated above");

        let needle = query.to_lowercase();
        let mut items = Vec::new();
        for window in &snap.windows {
            if window.title == self.own_title {
                continue;
            }
            let matched = if needle.is_empty() {
                snap.active_workspace.as_deref() == Some(window.workspace.as_str())
            } else {
                window.title.to_lowercase().contains(&needle)
            };
            if matched {
                items.push(ResultItem::window(&window.title, &window.id));
            }
        }

        Ok(Provision::fall_through(items))
    }
}

fn take_snapshot() -> Result<Snapshot> {
    let windows = run_wmctrl(&["-l"])?
        .lines()
        .filter_map(parse_window_line)
        .collect();
    let active_workspace = run_wmctrl(&["-d"])?.lines().find_map(parse_active_workspace);

    Ok(Snapshot {
        taken: Instant::now(),
        windows,
        active_workspace,
    })
}

fn run_wmctrl(args: &[&str]) -> Result<String> {
    let output = Command::new("wmctrl")
        .args(args)
        .output()
        .context("could not run wmctrl")?;
    if !output.status.success() {
        bail!("wmctrl {} exited with {}", args.join(" "), output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `wmctrl -l` line: window id, workspace, host, then the title with
/// whatever whitespace it contains.
fn parse_window_line(line: &str) -> Option<WindowEntry> {
    let (fields, title) = split_fields(line, 3)?;
    Some(WindowEntry {
        id: fields[0].to_string(),
        workspace: fields[1].to_string(),
        title: title.to_string(),
    })
}

/// `wmctrl -d` line: workspace id, then `*` on the active one.
fn parse_active_workspace(line: &str) -> Option<String> {
    let (fields, _) = split_fields(line, 2)?;
    (fields[1] == "*").then(|| fields[0].to_string())
}

/// Split off the first `n` whitespace-delimited fields and return them with
/// the trimmed remainder of the line.
fn split_fields(line: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut rest = line;
    let mut fields = Vec::with_capacity(n);
    for _ in 0..n {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = &rest[end..];
    }
    Some((fields, rest.trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_lines_keep_whitespace_in_titles() {
        let entry =
            parse_window_line("0x04000007  1 host My Document - Editor").unwrap();
        assert_eq!(entry.id, "0x04000007");
        assert_eq!(entry.workspace, "1");
        assert_eq!(entry.title, "My Document - Editor");
    }

    #[test]
    fn short_lines_are_rejected() {
        assert!(parse_window_line("0x04000007 1").is_none());
        assert!(parse_window_line("").is_none());
    }

    #[test]
    fn the_starred_workspace_is_active() {
        let listing = "0  - DG: 3840x1080\n1  * DG: 3840x1080\n";
        let active = listing.lines().find_map(parse_active_workspace);
        assert_eq!(active.as_deref(), Some("1"));
    }

    #[test]
    fn no_starred_workspace_means_none_active() {
        let listing = "0  - DG: 3840x1080\n1  - DG: 3840x1080\n";
        assert_eq!(listing.lines().find_map(parse_active_workspace), None);
    }

    fn provider_with(windows: Vec<WindowEntry>, active: Option<&str>) -> OpenWindowProvider {
        OpenWindowProvider {
            snapshot: Mutex::new(Some(Snapshot {
                taken: Instant::now(),
                windows,
                active_workspace: active.map(str::to_string),
            })),
            own_title: WINDOW_TITLE,
        }
    }

    fn window(id: &str, workspace: &str, title: &str) -> WindowEntry {
        WindowEntry {
            id: id.to_string(),
            workspace: workspace.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn empty_query_lists_the_active_workspace_only() {
        let provider = provider_with(
            vec![
                window("0x1", "0", "Browser"),
                window("0x2", "1", "Editor"),
                window("0x3", "0", "Terminal"),
            ],
            Some("0"),
        );

        let provision = provider.provide("").unwrap();
        let labels: Vec<&str> = provision.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Browser", "Terminal"]);
    }

    #[test]
    fn non_empty_query_matches_titles_across_workspaces() {
        let provider = provider_with(
            vec![
                window("0x1", "0", "Browser"),
                window("0x2", "1", "Text Editor"),
            ],
            Some("0"),
        );

        let provision = provider.provide("editor").unwrap();
        let labels: Vec<&str> = provision.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Text Editor"]);
    }

    #[test]
    fn the_launcher_window_is_excluded() {
        let provider = provider_with(
            vec![window("0x1", "0", WINDOW_TITLE), window("0x2", "0", "Files")],
            Some("0"),
        );

        let provision = provider.provide("").unwrap();
        let labels: Vec<&str> = provision.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Files"]);
    }
}
