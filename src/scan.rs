//! Source tree walking.
//!
//! Enumerates the source directory in a stable order and yields what the
//! pipeline has to do with each entry:
//!
//! ```text
//! content_src/
//! ├── .obsidian/               # hidden: skipped with everything inside
//! ├── _index.md                # Document
//! ├── about.md                 # Document
//! ├── blog/
//! │   ├── _assets/             # Assets (not descended)
//! │   │   └── cover.jpg
//! │   ├── my-post/
//! │   │   └── my-post.md       # Document
//! │   └── notes.txt            # ignored: not markdown
//! └── search.md                # Document
//! ```
//!
//! Siblings are visited sorted by file name, depth first. The order decides
//! which document wins an alias or destination conflict, so it must not
//! depend on the filesystem's native listing order.

use crate::config::PipelineConfig;
use crate::types::SourceEntry;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {0}")]
    SourceMissing(PathBuf),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// POSIX-style path of `path` relative to `root`.
fn relative_posix(root: &Path, path: &Path) -> Result<String, ScanError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in rel.components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| ScanError::NonUtf8Path(path.to_path_buf()))?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

/// Walk `source_root` and list its documents and asset directories.
pub fn scan(source_root: &Path, config: &PipelineConfig) -> Result<Vec<SourceEntry>, ScanError> {
    if !source_root.is_dir() {
        return Err(ScanError::SourceMissing(source_root.to_path_buf()));
    }

    let mut entries = Vec::new();
    let mut walker = WalkDir::new(source_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    while let Some(entry) = walker.next() {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy();

        if entry.file_type().is_dir() {
            if entry.depth() > 0 && name == config.assets_dir_name {
                entries.push(SourceEntry::Assets {
                    source_path: entry.path().to_path_buf(),
                    rel_path: relative_posix(source_root, entry.path())?,
                });
                walker.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_file() && config.is_markdown(&name) {
            entries.push(SourceEntry::Document {
                source_path: entry.path().to_path_buf(),
                rel_path: relative_posix(source_root, entry.path())?,
            });
        }
    }

    Ok(entries)
}
