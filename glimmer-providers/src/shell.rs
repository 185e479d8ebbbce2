use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use glimmer_core::{Provider, Provision, ResultItem};

/// Offers to run the query as a literal command line when its first token
/// resolves to an executable on the search path.
///
/// Always falls through so application and file matches still appear below
/// the command row.
pub struct CommandLineProvider;

impl Provider for CommandLineProvider {
    fn name(&self) -> &'static str {
        "command-line"
    }

    fn provide(&self, query: &str) -> Result<Provision> {
        let Some(first) = query.split_whitespace().next() else {
            return Ok(Provision::pass());
        };

        let status = Command::new("which")
            .arg("--")
            .arg(first)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("could not run `which`")?;
        if !status.success() {
            return Ok(Provision::pass());
        }

        Ok(Provision::fall_through(vec![ResultItem::executable(query)]))
    }
}

#[cfg(test)]
mod tests {
    use glimmer_core::{Control, ItemKind};

    use super::*;

    #[test]
    fn empty_query_contributes_nothing() {
        let provision = CommandLineProvider.provide("").unwrap();
        assert!(provision.items.is_empty());
        assert_eq!(provision.control, Control::Continue);
    }

    #[test]
    fn resolvable_first_token_emits_the_literal_command_line() {
        let provision = CommandLineProvider.provide("sh -c 'echo hi'").unwrap();

        assert_eq!(provision.items.len(), 1);
        assert_eq!(
            provision.items[0].kind,
            ItemKind::Executable {
                command_line: "sh -c 'echo hi'".to_string()
            }
        );
        assert_eq!(provision.control, Control::Continue);
    }

    #[test]
    fn unresolvable_first_token_contributes_nothing() {
        let provision = CommandLineProvider
            .provide("surely-not-an-installed-binary --flag")
            .unwrap();
        assert!(provision.items.is_empty());
        assert_eq!(provision.control, Control::Continue);
    }
}
