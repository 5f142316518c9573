//! Path classification for the leaf-directory layout.
//!
//! The target site generator addresses every page as a directory holding an
//! `index` file. Vault authors, on the other hand, write named files
//! (`guide.md`) or the "folder note" pattern (`guide/guide.md`). This module
//! maps any relative source path onto the leaf layout and derives the slug
//! and canonical URI from that mapping alone: no metadata, no filesystem.
//!
//! | Source | Destination | Main slug |
//! |--------|-------------|-----------|
//! | `index.md` | `index.md` | none |
//! | `blog/_index.md` | `blog/_index.md` | `blog` |
//! | `blog/my-post/my-post.md` | `blog/my-post/index.md` | `my-post` |
//! | `articles/new-name.md` | `articles/new-name/index.md` | `new-name` |
//! | `about.md` | `about/index.md` | `about` |
//!
//! Paths are POSIX-style strings relative to the source root. Matching of the
//! special file names is case-sensitive.

/// File stems that already are leaf documents and keep their location.
const LEAF_STEMS: &[&str] = &["index", "_index", "search"];

/// Result of classifying a relative source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// Destination path relative to the destination root.
    pub dest_rel_path: String,
    /// Slug derived from the path, `None` for the root document.
    pub main_slug: Option<String>,
}

/// Components of a relative path: parent directory, file stem, extension.
struct PathParts<'a> {
    parent: Option<&'a str>,
    stem: &'a str,
    ext: Option<&'a str>,
}

impl<'a> PathParts<'a> {
    fn split(rel: &'a str) -> Self {
        let rel = rel.trim_start_matches('/');
        let (parent, filename) = match rel.rsplit_once('/') {
            Some((parent, filename)) => (Some(parent).filter(|p| !p.is_empty()), filename),
            None => (None, rel),
        };
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };
        Self { parent, stem, ext }
    }

    /// Name of the immediate parent directory.
    fn last_dir(&self) -> Option<&'a str> {
        self.parent.map(|p| p.rsplit('/').next().unwrap_or(p))
    }

    fn index_name(&self) -> String {
        match self.ext {
            Some(ext) => format!("index.{ext}"),
            None => "index".to_string(),
        }
    }
}

fn join(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}/{name}"),
        None => name.to_string(),
    }
}

/// Classify a relative source path into its destination path and main slug.
///
/// Pure function of `rel`; see the module table for the mapping.
pub fn classify(rel: &str) -> Classified {
    let parts = PathParts::split(rel);

    if LEAF_STEMS.contains(&parts.stem) {
        return Classified {
            dest_rel_path: rel.trim_start_matches('/').to_string(),
            main_slug: parts.last_dir().map(String::from),
        };
    }

    let dest_rel_path = if parts.last_dir() == Some(parts.stem) {
        // Folder note: `X/X.md` collapses into the folder itself
        join(parts.parent, &parts.index_name())
    } else {
        let leaf = join(parts.parent, parts.stem);
        format!("{leaf}/{}", parts.index_name())
    };

    Classified {
        dest_rel_path,
        main_slug: Some(parts.stem.to_string()),
    }
}

/// Canonical URI for a destination path.
///
/// Strips a trailing `index`/`_index` file (or the extension of any other
/// file) and wraps the rest in slashes: `blog/my-post/index.md` becomes
/// `/blog/my-post/`, `index.md` becomes `/`, `search.md` becomes `/search/`.
pub fn canonical_uri(dest_rel_path: &str) -> String {
    let parts = PathParts::split(dest_rel_path);
    let path = if parts.stem == "index" || parts.stem == "_index" {
        parts.parent.map(String::from).unwrap_or_default()
    } else {
        join(parts.parent, parts.stem)
    };
    if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{path}/")
    }
}

/// Where a generic `X/index.<ext>` source file is renamed to (`X/X.<ext>`).
///
/// Returns `None` for anything else, including root `index.md`, `_index` and
/// `search` files.
pub fn index_rename_target(rel: &str) -> Option<String> {
    let parts = PathParts::split(rel);
    if parts.stem != "index" {
        return None;
    }
    let dir = parts.last_dir()?;
    let name = match parts.ext {
        Some(ext) => format!("{dir}.{ext}"),
        None => dir.to_string(),
    };
    Some(join(parts.parent, &name))
}

/// Still-image extension the site cannot serve; converted out of band.
const LEGACY_IMAGE_EXT: &str = ".heic";
/// Extension the converted files carry.
const CONVERTED_IMAGE_EXT: &str = ".jpeg";

/// The name a legacy still image has after conversion, if `path` is one.
///
/// `photo.heic` becomes `photo.jpeg`. The match is case-insensitive; anything
/// before the extension (directories, query strings are not expected) is kept.
pub fn converted_image_name(path: &str) -> Option<String> {
    let cut = path.len().checked_sub(LEGACY_IMAGE_EXT.len())?;
    let ext = path.get(cut..)?;
    if ext.eq_ignore_ascii_case(LEGACY_IMAGE_EXT) {
        Some(format!("{}{CONVERTED_IMAGE_EXT}", &path[..cut]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    // =========================================================================
    // Leaf documents
    // =========================================================================

    #[test]
    fn root_index_has_no_slug() {
        let c = classify("index.md");
        assert_eq!(c.dest_rel_path, "index.md");
        assert_eq!(c.main_slug, None);
    }

    #[test]
    fn root_section_index_has_no_slug() {
        let c = classify("_index.md");
        assert_eq!(c.dest_rel_path, "_index.md");
        assert_eq!(c.main_slug, None);
    }

    #[test]
    fn nested_index_takes_parent_slug() {
        let c = classify("blog/my-post/index.md");
        assert_eq!(c.dest_rel_path, "blog/my-post/index.md");
        assert_eq!(c.main_slug, slug("my-post"));
    }

    #[test]
    fn section_index_takes_parent_slug() {
        let c = classify("notes/_index.md");
        assert_eq!(c.dest_rel_path, "notes/_index.md");
        assert_eq!(c.main_slug, slug("notes"));
    }

    #[test]
    fn search_stays_in_place() {
        let c = classify("search.md");
        assert_eq!(c.dest_rel_path, "search.md");
        assert_eq!(c.main_slug, None);
    }

    #[test]
    fn leaf_names_are_case_sensitive() {
        let c = classify("blog/Index.md");
        assert_eq!(c.dest_rel_path, "blog/Index/index.md");
        assert_eq!(c.main_slug, slug("Index"));
    }

    // =========================================================================
    // Named documents
    // =========================================================================

    #[test]
    fn folder_note_collapses_into_folder() {
        let c = classify("blog/my-post/my-post.md");
        assert_eq!(c.dest_rel_path, "blog/my-post/index.md");
        assert_eq!(c.main_slug, slug("my-post"));
    }

    #[test]
    fn named_file_is_promoted_to_leaf() {
        let c = classify("articles/new-name.md");
        assert_eq!(c.dest_rel_path, "articles/new-name/index.md");
        assert_eq!(c.main_slug, slug("new-name"));
    }

    #[test]
    fn root_named_file_is_promoted_to_leaf() {
        let c = classify("about.md");
        assert_eq!(c.dest_rel_path, "about/index.md");
        assert_eq!(c.main_slug, slug("about"));
    }

    #[test]
    fn extension_is_preserved() {
        let c = classify("notes/idea.markdown");
        assert_eq!(c.dest_rel_path, "notes/idea/index.markdown");
    }

    #[test]
    fn dotted_stem_keeps_inner_dots() {
        let c = classify("releases/v1.2.md");
        assert_eq!(c.dest_rel_path, "releases/v1.2/index.md");
        assert_eq!(c.main_slug, slug("v1.2"));
    }

    #[test]
    fn classify_is_deterministic() {
        for path in ["a/b/c.md", "a/a.md", "index.md", "x/_index.md"] {
            assert_eq!(classify(path), classify(path));
        }
    }

    // =========================================================================
    // Canonical URI
    // =========================================================================

    #[test]
    fn uri_strips_index_file() {
        assert_eq!(canonical_uri("blog/my-post/index.md"), "/blog/my-post/");
    }

    #[test]
    fn uri_strips_section_index_file() {
        assert_eq!(canonical_uri("notes/_index.md"), "/notes/");
    }

    #[test]
    fn uri_for_root_index_is_slash() {
        assert_eq!(canonical_uri("index.md"), "/");
        assert_eq!(canonical_uri("_index.md"), "/");
    }

    #[test]
    fn uri_strips_extension_of_other_files() {
        assert_eq!(canonical_uri("search.md"), "/search/");
        assert_eq!(canonical_uri("docs/search.md"), "/docs/search/");
    }

    #[test]
    fn uri_of_classified_named_file() {
        let c = classify("articles/new-name.md");
        assert_eq!(canonical_uri(&c.dest_rel_path), "/articles/new-name/");
    }

    // =========================================================================
    // Source index rename
    // =========================================================================

    #[test]
    fn index_renamed_after_folder() {
        assert_eq!(
            index_rename_target("blog/my-post/index.md"),
            Some("blog/my-post/my-post.md".to_string())
        );
    }

    #[test]
    fn root_index_not_renamed() {
        assert_eq!(index_rename_target("index.md"), None);
    }

    #[test]
    fn section_index_and_named_files_not_renamed() {
        assert_eq!(index_rename_target("blog/_index.md"), None);
        assert_eq!(index_rename_target("blog/search.md"), None);
        assert_eq!(index_rename_target("blog/post.md"), None);
    }

    // =========================================================================
    // Legacy images
    // =========================================================================

    #[test]
    fn heic_converted_to_jpeg() {
        assert_eq!(
            converted_image_name("_assets/photo.heic"),
            Some("_assets/photo.jpeg".to_string())
        );
    }

    #[test]
    fn heic_match_ignores_case() {
        assert_eq!(
            converted_image_name("IMG_0001.HEIC"),
            Some("IMG_0001.jpeg".to_string())
        );
    }

    #[test]
    fn other_images_not_converted() {
        assert_eq!(converted_image_name("photo.jpg"), None);
        assert_eq!(converted_image_name("heic"), None);
        assert_eq!(converted_image_name(""), None);
    }

    #[test]
    fn renamed_index_classifies_to_same_destination() {
        let original = classify("blog/my-post/index.md");
        let renamed = classify(&index_rename_target("blog/my-post/index.md").unwrap());
        assert_eq!(original, renamed);
    }
}
