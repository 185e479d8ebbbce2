use std::path::{Path, PathBuf};

/// What activating an item does, together with the datum needed to do it.
///
/// The payload lives inside the variant so that a kind can never be paired
/// with the wrong datum; `Text` structurally has none and cannot be launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// A desktop application, opened via the configured open command.
    Application { desktop_file: PathBuf },
    /// A file or directory, opened or revealed in the file manager.
    File { path: PathBuf },
    /// A literal command line, run through the shell.
    Executable { command_line: String },
    /// A URL, opened in the browser.
    Url { url: String },
    /// An open window, raised by id.
    Window { id: String },
    /// Confirmation row that clears the persisted provider cache.
    CacheReset,
    /// Display-only text (calculator output, dictionary definitions, errors).
    Text,
}

impl ItemKind {
    /// Short stable tag for styling and for the wire representation.
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::Application { .. } => "application",
            ItemKind::File { .. } => "file",
            ItemKind::Executable { .. } => "executable",
            ItemKind::Url { .. } => "url",
            ItemKind::Window { .. } => "window",
            ItemKind::CacheReset => "cache-reset",
            ItemKind::Text => "text",
        }
    }

    /// The launch datum rendered as a string, if the kind carries one.
    pub fn payload(&self) -> Option<String> {
        match self {
            ItemKind::Application { desktop_file } => {
                Some(desktop_file.display().to_string())
            }
            ItemKind::File { path } => Some(path.display().to_string()),
            ItemKind::Executable { command_line } => Some(command_line.clone()),
            ItemKind::Url { url } => Some(url.clone()),
            ItemKind::Window { id } => Some(id.clone()),
            ItemKind::CacheReset | ItemKind::Text => None,
        }
    }
}

/// One candidate row in the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub label: String,
    pub kind: ItemKind,
    /// Whether selecting/copying the row is meaningful. Display-only rows
    /// (dictionary output, error messages) are not selectable.
    pub selectable: bool,
}

impl ResultItem {
    /// Display-only text row.
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ItemKind::Text,
            selectable: false,
        }
    }

    /// Text row that may be selected for copy-paste (calculator results).
    pub fn copyable_text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ItemKind::Text,
            selectable: true,
        }
    }

    pub fn application(label: impl Into<String>, desktop_file: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            kind: ItemKind::Application {
                desktop_file: desktop_file.into(),
            },
            selectable: true,
        }
    }

    /// File row labelled with the path itself.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            label: path.display().to_string(),
            kind: ItemKind::File { path },
            selectable: true,
        }
    }

    /// File row with a custom label, e.g. a bookmark title.
    pub fn titled_file(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            kind: ItemKind::File { path: path.into() },
            selectable: true,
        }
    }

    pub fn executable(command_line: impl Into<String>) -> Self {
        let command_line = command_line.into();
        Self {
            label: command_line.clone(),
            kind: ItemKind::Executable { command_line },
            selectable: true,
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ItemKind::Url { url: url.into() },
            selectable: true,
        }
    }

    pub fn window(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: ItemKind::Window { id: id.into() },
            selectable: true,
        }
    }

    pub fn cache_reset() -> Self {
        Self {
            label: "Reset cache".to_string(),
            kind: ItemKind::CacheReset,
            selectable: true,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            ItemKind::Application { desktop_file } => Some(desktop_file),
            ItemKind::File { path } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_items_carry_no_payload() {
        assert_eq!(ResultItem::text("4").kind.payload(), None);
        assert!(!ResultItem::text("oops").selectable);
        assert!(ResultItem::copyable_text("4").selectable);
    }

    #[test]
    fn payload_follows_kind() {
        let item = ResultItem::executable("ls -la");
        assert_eq!(item.kind.tag(), "executable");
        assert_eq!(item.kind.payload().as_deref(), Some("ls -la"));

        let item = ResultItem::window("Editor", "0x04000007");
        assert_eq!(item.kind.payload().as_deref(), Some("0x04000007"));

        let item = ResultItem::url("Docs", "https://example.org/docs");
        assert_eq!(item.kind.tag(), "url");
        assert_eq!(item.kind.payload().as_deref(), Some("https://example.org/docs"));
    }
}
