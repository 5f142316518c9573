//! The single-pass pipeline.
//!
//! Walks the vault once, in sorted order, and for every document:
//!
//! ```text
//! load ─→ classify ─→ normalize ─→ rewrite body ─→ accumulate aliases ─→ write
//!  │                                                                      │
//!  └─ unparseable frontmatter: counted, logged, skipped                    ├─ source (only if changed)
//!                                                                         └─ destination (always)
//! ```
//!
//! Asset directories met along the way are synced into the destination.
//! After the walk the alias table is frozen and written as the redirect file.
//!
//! Each document is computed completely by [`process_document`] before any
//! shared state (alias table, claimed destinations) is touched, so a failure
//! halfway through a document never leaves half its aliases in the table.
//!
//! ## Dry Runs
//!
//! With [`RunOptions::dry_run`] everything is computed and reported but
//! nothing is written: the destination is not cleared, sources are not
//! saved or renamed, assets are not copied and no redirect file is written.

use crate::aliases::{AliasTable, FrozenAliases};
use crate::assets::{self, AssetSummary};
use crate::config::{ConfigError, PipelineConfig};
use crate::frontmatter::{self, FrontmatterError};
use crate::metadata::{self, Normalized};
use crate::naming;
use crate::redirects;
use crate::rewrite::{self, RewriteOptions};
use crate::scan::{self, ScanError};
use crate::stats::Stats;
use crate::types::{Document, SourceEntry};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
    #[error("Walk error: {0}")]
    Walk(#[from] ScanError),
    #[error("Asset error: {0}")]
    Asset(#[from] assets::AssetError),
    #[error("Source directory does not exist: {0}")]
    SourceMissing(PathBuf),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute everything, write nothing.
    pub dry_run: bool,
}

/// Outcome of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Normalized and rewritten (and written, unless dry run).
    Processed,
    /// Destination already claimed by an earlier document; not written.
    Collision,
    /// Frontmatter could not be parsed; left untouched.
    Failed,
}

/// What happened to one source document, for progress output and the report.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed_from: Option<String>,
    pub destination: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub draft: bool,
    pub source_changed: bool,
    pub aliases: Vec<String>,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Progress events sent while the pipeline runs.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A document finished; `index` is its 1-based position in the walk.
    Document {
        index: usize,
        record: DocumentRecord,
    },
    Assets {
        rel_path: String,
        summary: AssetSummary,
    },
    Redirects {
        path: PathBuf,
        count: usize,
    },
}

/// Everything a run produced.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub documents: Vec<DocumentRecord>,
    pub stats: Stats,
    pub aliases: FrozenAliases,
    /// Set when the redirect file could not be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirects_error: Option<String>,
}

/// A document after the per-document transform, before anything is written.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub source_path: PathBuf,
    pub rel_path: String,
    pub dest_rel_path: String,
    pub canonical_uri: String,
    pub title: Option<String>,
    pub normalized: Normalized,
    /// Body as loaded; what goes back into the source file.
    pub source_body: String,
    /// Rewritten body for the destination copy.
    pub dest_body: String,
}

/// The per-document transform: classify, normalize, rewrite.
///
/// Touches no shared state besides `stats`.
pub fn process_document(
    doc: Document,
    config: &PipelineConfig,
    stats: &mut Stats,
) -> ProcessedDocument {
    let classified = naming::classify(&doc.rel_path);
    let canonical_uri = naming::canonical_uri(&classified.dest_rel_path);
    let title = doc.metadata.get("title").and_then(metadata::scalar_to_string);
    debug!(path = %doc.rel_path, title = ?title, uri = %canonical_uri, "processing document");

    let normalized = metadata::normalize(
        doc.metadata,
        classified.main_slug.as_deref(),
        &config.unimportant_frontmatter_keys,
        stats,
    );
    let options = RewriteOptions {
        tags_url_prefix: &config.tags_url_prefix,
    };
    let dest_body = rewrite::rewrite_body(&doc.body, &options, stats);

    ProcessedDocument {
        source_path: doc.source_path,
        rel_path: doc.rel_path,
        dest_rel_path: classified.dest_rel_path,
        canonical_uri,
        title,
        normalized,
        source_body: doc.body,
        dest_body,
    }
}

fn emit(events: &Option<Sender<PipelineEvent>>, event: PipelineEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

/// Clear and recreate the destination root, unless it is preserved.
fn prepare_destination(config: &PipelineConfig) -> Result<(), PipelineError> {
    let dest = &config.destination_directory;
    if config.source_directory.starts_with(dest) {
        return Err(ConfigError::Validation(format!(
            "destination_directory {} contains the source directory",
            dest.display()
        ))
        .into());
    }
    if dest.starts_with(&config.source_directory) {
        return Err(ConfigError::Validation(format!(
            "destination_directory {} is inside the source directory",
            dest.display()
        ))
        .into());
    }
    if dest.exists() && !config.preserve_destination {
        info!(path = %dest.display(), "clearing destination");
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;
    Ok(())
}

/// Rename `X/index.md` to `X/X.md` in the source tree when configured.
///
/// Returns the (possibly new) source path and relative path, plus the old
/// relative path if a rename happened.
fn maybe_rename_source(
    source_path: PathBuf,
    rel_path: String,
    config: &PipelineConfig,
    options: RunOptions,
    stats: &mut Stats,
) -> Result<(PathBuf, String, Option<String>), PipelineError> {
    if !config.rename_source_index_files {
        return Ok((source_path, rel_path, None));
    }
    let Some(target_rel) = naming::index_rename_target(&rel_path) else {
        return Ok((source_path, rel_path, None));
    };

    let target_path = config.source_directory.join(&target_rel);
    if target_path.exists() {
        warn!(from = %rel_path, to = %target_rel, "not renaming, target exists");
        return Ok((source_path, rel_path, None));
    }

    stats.source_files_renamed += 1;
    if options.dry_run {
        debug!(from = %rel_path, to = %target_rel, "would rename source");
        return Ok((source_path, target_rel, Some(rel_path)));
    }
    fs::rename(&source_path, &target_path)?;
    info!(from = %rel_path, to = %target_rel, "renamed source");
    Ok((target_path, target_rel, Some(rel_path)))
}

/// Shared state threaded through the walk.
struct RunState {
    table: AliasTable,
    claimed: HashSet<String>,
    stats: Stats,
}

fn run_document(
    source_path: PathBuf,
    rel_path: String,
    config: &PipelineConfig,
    options: RunOptions,
    state: &mut RunState,
) -> Result<DocumentRecord, PipelineError> {
    state.stats.source_md_files += 1;
    let (source_path, rel_path, renamed_from) =
        maybe_rename_source(source_path, rel_path, config, options, &mut state.stats)?;

    let (metadata, body) = match frontmatter::load(&source_path) {
        Ok(loaded) => loaded,
        Err(FrontmatterError::Io(e)) => return Err(e.into()),
        Err(e) => {
            error!(path = %rel_path, error = %e, "skipping document");
            state.stats.documents_failed += 1;
            let classified = naming::classify(&rel_path);
            return Ok(DocumentRecord {
                source: rel_path,
                renamed_from,
                uri: naming::canonical_uri(&classified.dest_rel_path),
                destination: classified.dest_rel_path,
                title: None,
                draft: false,
                source_changed: false,
                aliases: Vec::new(),
                status: DocumentStatus::Failed,
                error: Some(e.to_string()),
            });
        }
    };

    let doc = Document {
        source_path,
        rel_path,
        metadata,
        body,
    };
    let processed = process_document(doc, config, &mut state.stats);
    let normalized = &processed.normalized;

    let collision = !state.claimed.insert(processed.dest_rel_path.clone());
    if collision {
        warn!(
            source = %processed.rel_path,
            destination = %processed.dest_rel_path,
            "destination already written by an earlier document, skipping"
        );
        state.stats.destination_collisions += 1;
    }

    state.table.accumulate(
        &normalized.aliases,
        &processed.canonical_uri,
        normalized.draft,
        &mut state.stats,
    );

    if normalized.changed {
        state.stats.source_files_changed += 1;
        if !options.dry_run {
            debug!(path = %processed.rel_path, "saving source");
            frontmatter::save(
                &processed.source_path,
                &normalized.metadata,
                &processed.source_body,
            )?;
        }
    }

    if !collision && !options.dry_run {
        let dest_path = config.destination_directory.join(&processed.dest_rel_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        frontmatter::save(&dest_path, &normalized.metadata, &processed.dest_body)?;
    }

    Ok(DocumentRecord {
        source: processed.rel_path,
        renamed_from,
        destination: processed.dest_rel_path,
        uri: processed.canonical_uri,
        title: processed.title,
        draft: normalized.draft,
        source_changed: normalized.changed,
        aliases: normalized.aliases.clone(),
        status: if collision {
            DocumentStatus::Collision
        } else {
            DocumentStatus::Processed
        },
        error: None,
    })
}

/// Run the whole pipeline.
///
/// Fatal errors (missing source, unreadable files, failed destination
/// writes) abort the run. A failed redirect write does not: it is logged and
/// reported in [`RunReport::redirects_error`].
pub fn run(
    config: &PipelineConfig,
    options: RunOptions,
    events: Option<Sender<PipelineEvent>>,
) -> Result<RunReport, PipelineError> {
    let source_root = &config.source_directory;
    if !source_root.is_dir() {
        return Err(PipelineError::SourceMissing(source_root.clone()));
    }
    info!(
        source = %source_root.display(),
        destination = %config.destination_directory.display(),
        dry_run = options.dry_run,
        "starting run"
    );

    if !options.dry_run {
        prepare_destination(config)?;
    }

    let entries = scan::scan(source_root, config)?;
    info!(entries = entries.len(), "walked source tree");

    let mut state = RunState {
        table: AliasTable::new(),
        claimed: HashSet::new(),
        stats: Stats::default(),
    };
    let mut documents = Vec::new();

    for entry in entries {
        match entry {
            SourceEntry::Document {
                source_path,
                rel_path,
            } => {
                let record = run_document(source_path, rel_path, config, options, &mut state)?;
                emit(
                    &events,
                    PipelineEvent::Document {
                        index: documents.len() + 1,
                        record: record.clone(),
                    },
                );
                documents.push(record);
            }
            SourceEntry::Assets {
                source_path,
                rel_path,
            } => {
                if options.dry_run {
                    debug!(path = %rel_path, "skipping assets in dry run");
                    continue;
                }
                let dest = config.destination_directory.join(&rel_path);
                let summary = assets::sync_assets(&source_path, &dest, &mut state.stats)?;
                emit(&events, PipelineEvent::Assets { rel_path, summary });
            }
        }
    }

    let aliases = state.table.freeze();
    info!(aliases = aliases.len(), "alias table frozen");

    let redirects_error = if options.dry_run {
        None
    } else {
        write_redirects_reported(config, &aliases, &events)
    };

    let stats = state.stats;
    info!(summary = %stats, "run complete");
    Ok(RunReport {
        documents,
        stats,
        aliases,
        redirects_error,
    })
}

/// Write the redirect file; a failure is logged and returned as text.
fn write_redirects_reported(
    config: &PipelineConfig,
    aliases: &FrozenAliases,
    events: &Option<Sender<PipelineEvent>>,
) -> Option<String> {
    let path = &config.dest_redirects_file;
    match redirects::write_redirects(path, aliases, &config.src_redirects_base_file) {
        Ok(count) => {
            emit(
                events,
                PipelineEvent::Redirects {
                    path: path.clone(),
                    count,
                },
            );
            None
        }
        Err(e) => {
            error!(error = %e, "failed to write redirects");
            Some(e.to_string())
        }
    }
}
