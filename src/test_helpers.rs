//! Shared test utilities for the leafpress test suite.
//!
//! Provides fixture setup and lookup helpers over a [`RunReport`].
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = load_config(&tmp.path().join("leafpress.toml")).unwrap();
//! let report = run(&config, RunOptions::default(), None).unwrap();
//!
//! let post = find_record(&report, "blog/my-post/my-post.md");
//! assert_eq!(post.uri, "/blog/my-post/");
//! assert_eq!(redirect_target(&report, "my-post"), Some("/blog/my-post/"));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::pipeline::{DocumentRecord, RunReport};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures. The copy holds `leafpress.toml`, the vault under
/// `content_src/` and `_redirects_base.txt`.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Report lookups (panic with a clear message on miss)
// =========================================================================

/// Find a document record by source path. Panics if not found.
pub fn find_record<'a>(report: &'a RunReport, source: &str) -> &'a DocumentRecord {
    report
        .documents
        .iter()
        .find(|d| d.source == source)
        .unwrap_or_else(|| {
            let sources: Vec<&str> = report.documents.iter().map(|d| d.source.as_str()).collect();
            panic!("document '{source}' not found. Available: {sources:?}")
        })
}

/// Where an alias redirects to, if anywhere.
pub fn redirect_target<'a>(report: &'a RunReport, alias: &str) -> Option<&'a str> {
    report
        .aliases
        .iter()
        .find(|(a, _)| *a == alias)
        .map(|(_, uri)| uri)
}
