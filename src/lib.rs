//! # leafpress
//!
//! Prepares a Markdown vault for a static site generator that addresses
//! every page as a "leaf" directory holding an `index` file. The vault stays
//! the source of truth; leafpress normalizes its frontmatter in place and
//! writes a rewritten copy into the site's content tree, plus a redirect
//! file that keeps every URL a page ever had working.
//!
//! # Architecture: One Pass, One Accumulator
//!
//! ```text
//! content_src/  ──walk──→  per document: classify → normalize → rewrite → write
//!                                                        │
//!                                                        └─→ alias table
//!                                                              │
//!                                      freeze + sort ←─────────┘
//!                                            │
//!                                            └─→ static/_redirects
//! ```
//!
//! Documents are handled one at a time in sorted walk order. The only state
//! shared between documents is the alias table, the set of destination paths
//! already written, and the run counters. Everything else about a document
//! is a function of its path and its own contents, so each step is testable
//! without touching the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Drives a run: walk, per-document transform, writes, redirects |
//! | [`scan`] | Sorted source walk yielding documents and asset directories |
//! | [`naming`] | Source path → destination path, main slug and canonical URI |
//! | [`frontmatter`] | YAML frontmatter split, parse and serialize |
//! | [`metadata`] | Frontmatter normalization: slugs, aliases, tags, cleanup |
//! | [`aliases`] | First-writer-wins alias → URI table |
//! | [`rewrite`] | Body rewrite rules with code protection |
//! | [`redirects`] | Redirect file emission |
//! | [`assets`] | Newer-wins asset directory sync |
//! | [`config`] | `leafpress.toml` loading and validation |
//! | [`stats`] | Run counters |
//! | [`types`] | Shared types (`Document`, `SourceEntry`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Slugs Come From Paths
//!
//! A document's slug is derived from where the file lives, never from what
//! its frontmatter says. When the two disagree the path wins and the stored
//! slug is kept as an alias, so moving or renaming a file is the one way to
//! change a URL and the old URL keeps redirecting.
//!
//! ## First Writer Wins
//!
//! An alias that has shipped as a redirect must keep pointing where it
//! pointed. Later documents claiming the same alias are reported, never
//! allowed to overwrite. The walk is sorted so the winner is the same on
//! every machine.
//!
//! ## Pattern Rules, Not a Markdown Parser
//!
//! Body rewriting targets a handful of specific constructs with regexes.
//! Anything the rules do not recognize is passed through byte for byte, and
//! code (fenced blocks and inline spans) is swapped out before any rule runs
//! so examples in code are never touched.
//!
//! ## The Source Body Is Never Rewritten
//!
//! Only frontmatter fixes go back into the vault. Body rewrites target the
//! site renderer's syntax and exist in the destination copy alone, so the
//! vault stays readable in the editor it was written in.

pub mod aliases;
pub mod assets;
pub mod config;
pub mod frontmatter;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod redirects;
pub mod rewrite;
pub mod scan;
pub mod stats;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
