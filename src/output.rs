//! CLI output formatting for a pipeline run.
//!
//! # Information-First Display
//!
//! Every document leads with its positional index and source path, with
//! the destination on the same line. What the run did to it follows as
//! indented context lines. Logging (`tracing`) is for diagnostics; this
//! module is the inventory a user reads.
//!
//! # Output Format
//!
//! ```text
//! 001 _index.md → _index.md
//!     URI: /
//! 002 blog/my-post/my-post.md → blog/my-post/index.md
//!     URI: /blog/my-post/
//!     Title: My Post
//!     Aliases: my-post, 2019/05/old-post
//!     Source updated
//! 003 blog/wip.md → blog/wip/index.md
//!     URI: /blog/wip/
//!     Draft (no redirects)
//! Assets blog/_assets: 3 copied, 1 up to date
//! Redirects → static/_redirects (42 rules)
//!
//! Stats
//!     source_md_files              3
//!     source_files_changed         1
//!     ...
//!
//! 3 documents, 1 changed, 42 redirects
//! ```
//!
//! # Architecture
//!
//! Each piece has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::{DocumentRecord, DocumentStatus, PipelineEvent, RunReport};
use crate::stats::Stats;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line for a document: index, source and destination.
///
/// ```text
/// 001 about.md → about/index.md
/// 002 guide/index.md → guide/index.md (collision, not written)
/// ```
fn document_header(index: usize, record: &DocumentRecord) -> String {
    let base = format!(
        "{} {} → {}",
        format_index(index),
        record.source,
        record.destination
    );
    match record.status {
        DocumentStatus::Processed => base,
        DocumentStatus::Collision => format!("{base} (collision, not written)"),
        DocumentStatus::Failed => format!("{base} (failed)"),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// Run progress
// ============================================================================

/// Format a single document as display lines.
pub fn format_document(index: usize, record: &DocumentRecord) -> Vec<String> {
    let mut lines = vec![document_header(index, record)];
    let pad = indent(1);

    if let Some(error) = &record.error {
        lines.push(format!("{pad}Error: {}", truncate(error, 80)));
        return lines;
    }

    lines.push(format!("{pad}URI: {}", record.uri));
    if let Some(from) = &record.renamed_from {
        lines.push(format!("{pad}Renamed from: {from}"));
    }
    if let Some(title) = record.title.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("{pad}Title: {}", truncate(title, 60)));
    }
    if record.draft {
        lines.push(format!("{pad}Draft (no redirects)"));
    } else if !record.aliases.is_empty() {
        lines.push(format!("{pad}Aliases: {}", record.aliases.join(", ")));
    }
    if record.source_changed {
        lines.push(format!("{pad}Source updated"));
    }
    lines
}

/// Format a single progress event as display lines.
pub fn format_pipeline_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::Document { index, record } => format_document(*index, record),
        PipelineEvent::Assets { rel_path, summary } => {
            let mut line = format!(
                "Assets {}: {} copied, {} up to date",
                rel_path, summary.copied, summary.up_to_date
            );
            if summary.pending_conversion > 0 {
                line.push_str(&format!(
                    ", {} pending conversion",
                    summary.pending_conversion
                ));
            }
            vec![line]
        }
        PipelineEvent::Redirects { path, count } => {
            vec![format!("Redirects → {} ({} rules)", path.display(), count)]
        }
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Non-zero counters, aligned, under a `Stats` heading.
pub fn format_stats(stats: &Stats) -> Vec<String> {
    let entries: Vec<(&str, u32)> = stats
        .entries()
        .into_iter()
        .filter(|(_, value)| *value > 0)
        .collect();
    if entries.is_empty() {
        return vec!["Stats".to_string(), format!("{}(nothing to do)", indent(1))];
    }

    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut lines = vec!["Stats".to_string()];
    for (name, value) in entries {
        lines.push(format!("{}{:<width$} {}", indent(1), name, value));
    }
    lines
}

/// Stats table, redirect failure if any, and the one-line summary.
pub fn format_run_summary(report: &RunReport) -> Vec<String> {
    let mut lines = vec![String::new()];
    lines.extend(format_stats(&report.stats));
    lines.push(String::new());
    if let Some(error) = &report.redirects_error {
        lines.push(format!("Redirects not written: {error}"));
    }
    lines.push(report.stats.to_string());
    lines
}

pub fn print_run_summary(report: &RunReport) {
    for line in format_run_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
