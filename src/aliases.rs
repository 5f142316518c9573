//! The global alias table.
//!
//! Maps every alias claimed by a published document to that document's
//! canonical URI. Built one document at a time in walk order and then frozen,
//! sorted, for the redirect file.
//!
//! ## Conflicts
//!
//! The first document to claim an alias keeps it. Later claims are counted
//! and logged but never overwrite: an alias that already shipped as a redirect
//! must keep pointing where it pointed. This makes the table depend on walk
//! order, which is why the walker sorts.
//!
//! ## Drafts
//!
//! Draft documents contribute nothing. Their aliases still go through the
//! conflict check, so a draft colliding with a published page is reported.

use crate::stats::Stats;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// What happened to one document's aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulateOutcome {
    pub added: u32,
    pub conflicts: u32,
    pub skipped_draft: u32,
}

/// Alias → canonical URI, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
    /// Runtime index into `entries` by alias.
    index: HashMap<String, usize>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The URI an alias currently resolves to.
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.index
            .get(alias)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Entries in the order they were claimed.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, u)| (a.as_str(), u.as_str()))
    }

    /// Offer a document's aliases to the table.
    ///
    /// Existing keys win (conflict); drafts insert nothing.
    pub fn accumulate(
        &mut self,
        aliases: &[String],
        canonical_uri: &str,
        is_draft: bool,
        stats: &mut Stats,
    ) -> AccumulateOutcome {
        let mut outcome = AccumulateOutcome::default();
        // `/old` and `old` from the same document are one claim
        let mut seen = HashSet::new();

        for alias in aliases {
            let key = alias_key(alias);
            if key.is_empty() || !seen.insert(key) {
                continue;
            }

            if let Some(existing) = self.get(key) {
                warn!(
                    alias = %key,
                    existing = %existing,
                    rejected = %canonical_uri,
                    "alias already claimed, keeping first"
                );
                stats.alias_conflicts += 1;
                outcome.conflicts += 1;
                continue;
            }

            if is_draft {
                stats.draft_aliases_skipped += 1;
                outcome.skipped_draft += 1;
                continue;
            }

            debug!(alias = %key, uri = %canonical_uri, "adding alias");
            self.index.insert(key.to_string(), self.entries.len());
            self.entries
                .push((key.to_string(), canonical_uri.to_string()));
            stats.foreverlinks_collected += 1;
            outcome.added += 1;
        }

        outcome
    }

    /// Freeze the table, sorted by alias, for emission.
    pub fn freeze(self) -> FrozenAliases {
        let mut entries = self.entries;
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        FrozenAliases { entries }
    }
}

/// Table key for an alias: full path kept, surrounding whitespace and
/// leading slashes dropped (`/old/post` and `old/post` are the same alias).
pub fn alias_key(alias: &str) -> &str {
    alias.trim().trim_start_matches('/')
}

/// The finished alias table, sorted by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrozenAliases {
    entries: Vec<(String, String)>,
}

impl FrozenAliases {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, u)| (a.as_str(), u.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_table_is_empty() {
        let table = AliasTable::new();
        assert!(table.is_empty());
        assert_eq!(table.get("anything"), None);
    }

    #[test]
    fn aliases_map_to_uri() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        let outcome = table.accumulate(&list(&["my-post", "old"]), "/blog/my-post/", false, &mut stats);

        assert_eq!(outcome.added, 2);
        assert_eq!(table.get("my-post"), Some("/blog/my-post/"));
        assert_eq!(table.get("old"), Some("/blog/my-post/"));
        assert_eq!(stats.foreverlinks_collected, 2);
    }

    #[test]
    fn first_writer_wins() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        table.accumulate(&list(&["guide"]), "/docs/guide/", false, &mut stats);
        let outcome = table.accumulate(&list(&["guide"]), "/blog/guide/", false, &mut stats);

        assert_eq!(outcome.conflicts, 1);
        assert_eq!(table.get("guide"), Some("/docs/guide/"));
        assert_eq!(stats.alias_conflicts, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn slash_variants_from_one_document_are_one_claim() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        let outcome = table.accumulate(&list(&["/my-post", "my-post", " my-post"]), "/blog/my-post/", false, &mut stats);

        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.conflicts, 0);
        assert_eq!(stats.alias_conflicts, 0);
        assert_eq!(table.get("my-post"), Some("/blog/my-post/"));
    }

    #[test]
    fn drafts_add_nothing() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        let outcome = table.accumulate(&list(&["a", "b", "c"]), "/wip/", true, &mut stats);

        assert!(table.is_empty());
        assert_eq!(outcome.skipped_draft, 3);
        assert_eq!(stats.draft_aliases_skipped, 3);
        assert_eq!(stats.foreverlinks_collected, 0);
    }

    #[test]
    fn draft_colliding_with_published_is_a_conflict() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        table.accumulate(&list(&["guide"]), "/guide/", false, &mut stats);
        table.accumulate(&list(&["guide"]), "/wip/guide/", true, &mut stats);

        assert_eq!(stats.alias_conflicts, 1);
        assert_eq!(stats.draft_aliases_skipped, 0);
    }

    #[test]
    fn full_alias_paths_kept() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        table.accumulate(&list(&["/2019/05/old-post"]), "/blog/new/", false, &mut stats);

        assert_eq!(table.get("2019/05/old-post"), Some("/blog/new/"));
        assert_eq!(table.get("old-post"), None);
    }

    #[test]
    fn blank_aliases_ignored() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        let outcome = table.accumulate(&list(&["", "  ", "/"]), "/x/", false, &mut stats);
        assert_eq!(outcome, AccumulateOutcome::default());
        assert!(table.is_empty());
    }

    #[test]
    fn iter_keeps_claim_order() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        table.accumulate(&list(&["zeta"]), "/z/", false, &mut stats);
        table.accumulate(&list(&["alpha"]), "/a/", false, &mut stats);

        let aliases: Vec<&str> = table.iter().map(|(a, _)| a).collect();
        assert_eq!(aliases, vec!["zeta", "alpha"]);
    }

    #[test]
    fn freeze_sorts_by_alias() {
        let mut table = AliasTable::new();
        let mut stats = Stats::default();
        table.accumulate(&list(&["zeta", "mid"]), "/z/", false, &mut stats);
        table.accumulate(&list(&["alpha"]), "/a/", false, &mut stats);

        let frozen = table.freeze();
        let pairs: Vec<(&str, &str)> = frozen.iter().collect();
        assert_eq!(pairs, vec![("alpha", "/a/"), ("mid", "/z/"), ("zeta", "/z/")]);
    }

    #[test]
    fn alias_key_strips_leading_slashes_and_space() {
        assert_eq!(alias_key(" /old/post "), "old/post");
        assert_eq!(alias_key("plain"), "plain");
    }
}
