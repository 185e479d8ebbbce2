use std::process::Command;

use anyhow::Result;
use glimmer_core::{Provider, Provision, ResultItem};

/// Looks up `define <word>` queries with the external `dict` client.
///
/// Always contributes exactly one display-only item once triggered - the
/// lookup output on success, the failure text otherwise - and stops the
/// chain either way. Lookups block for as long as `dict` takes; a slow
/// lookup only risks its task being superseded.
pub struct DictionaryProvider;

impl Provider for DictionaryProvider {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn provide(&self, query: &str) -> Result<Provision> {
        let word = match query.strip_prefix("define ") {
            Some(word) if !word.trim().is_empty() => word.trim(),
            _ => return Ok(Provision::pass()),
        };

        let item = match Command::new("dict").arg(word).output() {
            Ok(output) => {
                // Definitions land on stdout, lookup failures on stderr;
                // show whichever the client produced.
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                ResultItem::text(text.trim_end())
            }
            Err(err) => ResultItem::text(format!("dict: {err}")),
        };

        Ok(Provision::stop(vec![item]))
    }
}
