//! Run statistics.
//!
//! Every rule that fires bumps one named counter. Counters are observational
//! only: no control flow reads them. They are printed at the end of a run and
//! serialized into the JSON report.

use serde::Serialize;
use std::fmt;

/// Named counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    // Documents
    pub source_md_files: u32,
    pub documents_failed: u32,
    pub source_files_changed: u32,
    pub source_files_renamed: u32,
    pub destination_collisions: u32,

    // Frontmatter
    pub frontmatter_source_cleanups: u32,
    pub aliases_collected: u32,
    pub slugs_collected: u32,
    pub missing_slugs_fixed: u32,
    pub divergent_slugs_fixed: u32,
    pub tags_cleaned: u32,
    pub cover_images_converted: u32,

    // Alias table
    pub foreverlinks_collected: u32,
    pub alias_conflicts: u32,
    pub draft_aliases_skipped: u32,

    // Body
    pub youtube_links_converted: u32,
    pub index_links_rewritten: u32,
    pub duplicate_links_collapsed: u32,
    pub code_spans_protected: u32,
    pub hashtags_linked: u32,
    pub image_captions_promoted: u32,
    pub image_links_converted: u32,
    pub highlights_converted: u32,
    pub heading_hashes_escaped: u32,
    pub html_links_found: u32,

    // Assets
    pub assets_copied: u32,
    pub assets_up_to_date: u32,
    pub assets_pending_conversion: u32,
}

impl Stats {
    /// All counters as `(name, value)` pairs in declaration order.
    pub fn entries(&self) -> Vec<(&'static str, u32)> {
        vec![
            ("source_md_files", self.source_md_files),
            ("documents_failed", self.documents_failed),
            ("source_files_changed", self.source_files_changed),
            ("source_files_renamed", self.source_files_renamed),
            ("destination_collisions", self.destination_collisions),
            ("frontmatter_source_cleanups", self.frontmatter_source_cleanups),
            ("aliases_collected", self.aliases_collected),
            ("slugs_collected", self.slugs_collected),
            ("missing_slugs_fixed", self.missing_slugs_fixed),
            ("divergent_slugs_fixed", self.divergent_slugs_fixed),
            ("tags_cleaned", self.tags_cleaned),
            ("cover_images_converted", self.cover_images_converted),
            ("foreverlinks_collected", self.foreverlinks_collected),
            ("alias_conflicts", self.alias_conflicts),
            ("draft_aliases_skipped", self.draft_aliases_skipped),
            ("youtube_links_converted", self.youtube_links_converted),
            ("index_links_rewritten", self.index_links_rewritten),
            ("duplicate_links_collapsed", self.duplicate_links_collapsed),
            ("code_spans_protected", self.code_spans_protected),
            ("hashtags_linked", self.hashtags_linked),
            ("image_captions_promoted", self.image_captions_promoted),
            ("image_links_converted", self.image_links_converted),
            ("highlights_converted", self.highlights_converted),
            ("heading_hashes_escaped", self.heading_hashes_escaped),
            ("html_links_found", self.html_links_found),
            ("assets_copied", self.assets_copied),
            ("assets_up_to_date", self.assets_up_to_date),
            ("assets_pending_conversion", self.assets_pending_conversion),
        ]
    }
}

/// One-line summary, e.g. `12 documents, 3 changed, 40 redirects, 1 conflict`.
impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents, {} changed, {} redirects",
            self.source_md_files, self.source_files_changed, self.foreverlinks_collected
        )?;
        match self.alias_conflicts {
            0 => {}
            1 => write!(f, ", 1 conflict")?,
            n => write!(f, ", {n} conflicts")?,
        }
        if self.documents_failed > 0 {
            write!(f, ", {} failed", self.documents_failed)?;
        }
        Ok(())
    }
}
