//! Run configuration.
//!
//! Loads and validates `leafpress.toml`. There is exactly one config file per
//! run; unlike content metadata it is not cascaded through the source tree.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_directory = "content_src"
//! destination_directory = "content"
//! preserve_destination = false
//!
//! src_redirects_base_file = "_redirects_base.txt"
//! dest_redirects_file = "static/_redirects"
//!
//! unimportant_frontmatter_keys = ["dateset", "priority", "addvotes",
//!     "countvotes", "notifications-flags", "lastedit-user"]
//!
//! assets_dir_name = "_assets"
//! markdown_extensions = ["md"]
//! tags_url_prefix = "/tags/"
//! rename_source_index_files = false
//! ```
//!
//! ## Path Resolution
//!
//! Relative paths are resolved against the directory containing the config
//! file, not the current working directory. A config checked into the root of
//! a site repository therefore works no matter where the binary is invoked.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILENAME: &str = "leafpress.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `leafpress.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root of the markdown vault to read.
    pub source_directory: PathBuf,
    /// Root of the generated content tree.
    pub destination_directory: PathBuf,
    /// Keep the destination tree between runs instead of recreating it.
    pub preserve_destination: bool,
    /// Static redirect rules appended after the generated ones.
    pub src_redirects_base_file: PathBuf,
    /// Where the redirect table is written.
    pub dest_redirects_file: PathBuf,
    /// Frontmatter keys removed from every document.
    pub unimportant_frontmatter_keys: Vec<String>,
    /// Directories with this name are copied verbatim instead of processed.
    pub assets_dir_name: String,
    /// File extensions (without dot) treated as documents.
    pub markdown_extensions: Vec<String>,
    /// URL prefix of the tag listing pages, e.g. `/tags/`.
    pub tags_url_prefix: String,
    /// Rename `X/index.md` to `X/X.md` in the source tree.
    pub rename_source_index_files: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("content_src"),
            destination_directory: PathBuf::from("content"),
            preserve_destination: false,
            src_redirects_base_file: PathBuf::from("_redirects_base.txt"),
            dest_redirects_file: PathBuf::from("static/_redirects"),
            unimportant_frontmatter_keys: [
                "dateset",
                "priority",
                "addvotes",
                "countvotes",
                "notifications-flags",
                "lastedit-user",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            assets_dir_name: "_assets".to_string(),
            markdown_extensions: vec!["md".to_string()],
            tags_url_prefix: "/tags/".to_string(),
            rename_source_index_files: false,
        }
    }
}

impl PipelineConfig {
    /// Validate values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_directory == self.destination_directory {
            return Err(ConfigError::Validation(
                "source_directory and destination_directory must differ".into(),
            ));
        }
        if self.assets_dir_name.is_empty() {
            return Err(ConfigError::Validation(
                "assets_dir_name must not be empty".into(),
            ));
        }
        if self.markdown_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "markdown_extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self
            .markdown_extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "markdown_extensions entries are bare extensions, got {ext:?}"
            )));
        }
        if !self.tags_url_prefix.starts_with('/') || !self.tags_url_prefix.ends_with('/') {
            return Err(ConfigError::Validation(
                "tags_url_prefix must start and end with '/'".into(),
            ));
        }
        Ok(())
    }

    /// Resolve every relative path against `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for path in [
            &mut self.source_directory,
            &mut self.destination_directory,
            &mut self.src_redirects_base_file,
            &mut self.dest_redirects_file,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// Whether `name` (a file name) carries one of the markdown extensions.
    pub fn is_markdown(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                self.markdown_extensions
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }
}

/// Parse and validate config from TOML text, without touching the filesystem.
pub fn parse_config(content: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// A missing file is an error: the pipeline rewrites files in place and must
/// not guess where the vault lives.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    let base = path.parent().unwrap_or(Path::new(""));
    Ok(config.resolve_paths(base))
}

/// Returns a fully-commented stock `leafpress.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# leafpress configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory of this file.
# Unknown keys will cause an error.

# Markdown vault to read. Files here are updated in place when their
# frontmatter needs fixing (slugs, aliases, tags, cleanups).
source_directory = "content_src"

# Generated content tree. Cleared and recreated on every run unless
# preserve_destination is true.
destination_directory = "content"
preserve_destination = false

# ---------------------------------------------------------------------------
# Redirects
# ---------------------------------------------------------------------------
# Hand-written rules appended after the generated alias redirects.
src_redirects_base_file = "_redirects_base.txt"

# Output file, one "*/<alias> <uri> 301" rule per line.
dest_redirects_file = "static/_redirects"

# ---------------------------------------------------------------------------
# Frontmatter
# ---------------------------------------------------------------------------
# Keys removed from every document.
unimportant_frontmatter_keys = [
    "dateset",
    "priority",
    "addvotes",
    "countvotes",
    "notifications-flags",
    "lastedit-user",
]

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
# Directories with this name are copied file by file (newer wins).
assets_dir_name = "_assets"

# Extensions of the files treated as documents.
markdown_extensions = ["md"]

# Prefix of tag listing pages used when linking "#tag" tokens.
tags_url_prefix = "/tags/"

# Rename "X/index.md" to "X/X.md" in the source vault.
rename_source_index_files = false
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_paths() {
        let config = PipelineConfig::default();
        assert_eq!(config.source_directory, PathBuf::from("content_src"));
        assert_eq!(config.destination_directory, PathBuf::from("content"));
        assert_eq!(config.dest_redirects_file, PathBuf::from("static/_redirects"));
        assert!(!config.preserve_destination);
    }

    #[test]
    fn default_config_has_unimportant_keys() {
        let config = PipelineConfig::default();
        assert_eq!(config.unimportant_frontmatter_keys.len(), 6);
        assert!(config.unimportant_frontmatter_keys.contains(&"priority".to_string()));
    }

    #[test]
    fn parse_partial_config() {
        let config = parse_config(
            r#"
source_directory = "vault"
unimportant_frontmatter_keys = ["foo"]
"#,
        )
        .unwrap();
        assert_eq!(config.source_directory, PathBuf::from("vault"));
        assert_eq!(config.unimportant_frontmatter_keys, vec!["foo"]);
        // Defaults preserved
        assert_eq!(config.destination_directory, PathBuf::from("content"));
        assert_eq!(config.tags_url_prefix, "/tags/");
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn unknown_key_rejected() {
        let result = parse_config("sorce_directory = \"typo\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn same_source_and_destination_rejected() {
        let result = parse_config(
            r#"
source_directory = "content"
destination_directory = "content"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn tags_prefix_needs_slashes() {
        let result = parse_config("tags_url_prefix = \"tags\"");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn dotted_extension_rejected() {
        let result = parse_config("markdown_extensions = [\".md\"]");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_extensions_rejected() {
        let result = parse_config("markdown_extensions = []");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // load_config
    // =========================================================================

    #[test]
    fn load_config_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(&tmp.path().join(CONFIG_FILENAME));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_config_resolves_relative_paths() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "source_directory = \"vault\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.source_directory, tmp.path().join("vault"));
        assert_eq!(config.destination_directory, tmp.path().join("content"));
        assert_eq!(
            config.dest_redirects_file,
            tmp.path().join("static/_redirects")
        );
    }

    #[test]
    fn load_config_keeps_absolute_paths() {
        let tmp = TempDir::new().unwrap();
        let abs = tmp.path().join("elsewhere");
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            format!("destination_directory = {:?}\n", abs.to_string_lossy()),
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.destination_directory, abs);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "this is not [valid toml").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn is_markdown_matches_configured_extensions() {
        let config = PipelineConfig::default();
        assert!(config.is_markdown("post.md"));
        assert!(config.is_markdown("POST.MD"));
        assert!(!config.is_markdown("photo.jpg"));
        assert!(!config.is_markdown("README"));
    }

    #[test]
    fn stock_config_toml_is_valid_and_matches_defaults() {
        let config = parse_config(stock_config_toml()).unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(config.source_directory, defaults.source_directory);
        assert_eq!(
            config.unimportant_frontmatter_keys,
            defaults.unimportant_frontmatter_keys
        );
        assert_eq!(config.assets_dir_name, defaults.assets_dir_name);
        assert_eq!(config.tags_url_prefix, defaults.tags_url_prefix);
    }
}
