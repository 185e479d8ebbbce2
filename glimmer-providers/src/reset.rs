use std::collections::HashSet;

use anyhow::Result;
use glimmer_core::{Provider, Provision, ResultItem};

/// Pure command provider: a query whose word set is exactly `cache` plus one
/// of `empty`/`clear`/`reset` yields a single confirmation item whose
/// activation clears the persisted provider cache.
pub struct ResetCacheProvider;

const VERBS: [&str; 3] = ["empty", "clear", "reset"];

impl Provider for ResetCacheProvider {
    fn name(&self) -> &'static str {
        "reset-cache"
    }

    fn provide(&self, query: &str) -> Result<Provision> {
        let lowered = query.to_lowercase();
        let words: HashSet<&str> = lowered.split_whitespace().collect();

        if words.len() == 2
            && words.contains("cache")
            && VERBS.iter().any(|verb| words.contains(verb))
        {
            return Ok(Provision::stop(vec![ResultItem::cache_reset()]));
        }
        Ok(Provision::pass())
    }
}
