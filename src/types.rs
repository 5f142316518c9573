//! Types shared across the pipeline stages.

use serde_yaml::Mapping;
use std::path::PathBuf;

/// A markdown document during its processing turn.
///
/// Owned by exactly one pipeline step at a time; nothing outlives the pass.
#[derive(Debug, Clone)]
pub struct Document {
    /// Absolute (or config-relative) path of the source file.
    pub source_path: PathBuf,
    /// POSIX-style path relative to the source root, e.g. `blog/post.md`.
    pub rel_path: String,
    /// Parsed frontmatter.
    pub metadata: Mapping,
    /// Everything after the frontmatter block.
    pub body: String,
}

/// An entry yielded by the source walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEntry {
    /// A markdown document to run through the pipeline.
    Document {
        source_path: PathBuf,
        rel_path: String,
    },
    /// A directory copied verbatim into the destination tree.
    Assets {
        source_path: PathBuf,
        rel_path: String,
    },
}
