//! Redirect file emission.
//!
//! One line per alias, sorted by alias, in the static host's format:
//!
//! ```text
//! */2019/05/old-post /blog/new-post/ 301
//! */my-post /blog/my-post/ 301
//! ```
//!
//! The leading `*` matches the alias under any path prefix. Hand-written
//! rules from the base file are appended verbatim after the generated ones.

use crate::aliases::FrozenAliases;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RedirectError {
    #[error("IO error writing redirects to {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RedirectError + use<> {
    let path = path.display().to_string();
    move |source| RedirectError::Io { path, source }
}

/// Render the generated part of the redirect file.
pub fn format_redirects(aliases: &FrozenAliases) -> String {
    aliases
        .iter()
        .map(|(alias, uri)| format!("*/{alias} {uri} 301\n"))
        .collect()
}

/// Write the redirect file, followed by the base file's contents if present.
///
/// Parent directories of `dest` are created. Returns the number of generated
/// lines.
pub fn write_redirects(
    dest: &Path,
    aliases: &FrozenAliases,
    base_file: &Path,
) -> Result<usize, RedirectError> {
    let mut text = format_redirects(aliases);

    if base_file.is_file() {
        let base = fs::read_to_string(base_file).map_err(io_err(base_file))?;
        debug!(base = %base_file.display(), "appending base redirects");
        text.push_str(&base);
    } else {
        debug!(base = %base_file.display(), "no base redirects file");
    }

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    fs::write(dest, text).map_err(io_err(dest))?;

    info!(path = %dest.display(), count = aliases.len(), "wrote redirects");
    Ok(aliases.len())
}
