//! YAML frontmatter codec.
//!
//! Splits a document into its metadata mapping and body, and joins them back.
//! Metadata is a [`serde_yaml::Mapping`], which keeps insertion order, so
//! keys this crate knows nothing about survive a round trip in place. Scalar
//! formatting (quoting style, comments) is normalized by the YAML emitter.
//!
//! ```text
//! ---
//! title: Hello
//! slug: hello
//! ---
//! Body text starts here.
//! ```
//!
//! A file that does not start with a `---` line has no frontmatter: its
//! metadata is empty and the whole text is the body. The body is kept
//! byte-for-byte, including its leading newline if any.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

const DELIM: &str = "---";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("frontmatter is not a mapping")]
    NotAMapping,
    #[error("frontmatter has no closing '---' line")]
    Unterminated,
}

/// Locate the raw YAML block and the body.
///
/// Returns `Ok(None)` when the text has no frontmatter at all.
fn split(text: &str) -> Result<Option<(&str, &str)>, FrontmatterError> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim_end() != DELIM {
        return Ok(None);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == DELIM {
            return Ok(Some((&text[yaml_start..offset], &text[offset + line.len()..])));
        }
        offset += line.len();
    }
    Err(FrontmatterError::Unterminated)
}

/// Parse a document into `(metadata, body)`.
pub fn parse(text: &str) -> Result<(Mapping, String), FrontmatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some((yaml, body)) = split(text)? else {
        return Ok((Mapping::new(), text.to_string()));
    };

    if yaml.trim().is_empty() {
        return Ok((Mapping::new(), body.to_string()));
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(metadata) => Ok((metadata, body.to_string())),
        Value::Null => Ok((Mapping::new(), body.to_string())),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Join metadata and body back into document text.
///
/// Empty metadata produces the bare body, without an empty `---` block.
pub fn serialize(metadata: &Mapping, body: &str) -> Result<String, FrontmatterError> {
    if metadata.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(metadata)?;
    Ok(format!("{DELIM}\n{yaml}{DELIM}\n{body}"))
}

/// Read and parse a document from disk.
pub fn load(path: &Path) -> Result<(Mapping, String), FrontmatterError> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

/// Serialize and write a document to disk.
pub fn save(path: &Path, metadata: &Mapping, body: &str) -> Result<(), FrontmatterError> {
    let text = serialize(metadata, body)?;
    fs::write(path, text)?;
    Ok(())
}
